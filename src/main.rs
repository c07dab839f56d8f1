use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::watch;

use quorum_kv::cluster::config::NodeConfig;
use quorum_kv::cluster::settings::RuntimeSettings;
use quorum_kv::cluster::types::NodeRole;
use quorum_kv::replication::client::ReplicationClient;
use quorum_kv::replication::handlers::{handle_config, handle_replicate, handle_set};
use quorum_kv::replication::protocol::{ENDPOINT_CONFIG, ENDPOINT_REPLICATE, ENDPOINT_SET};
use quorum_kv::replication::writer::LeaderWriter;
use quorum_kv::storage::handlers::{
    handle_dump, handle_dump_versions, handle_get, handle_health, handle_stats,
};
use quorum_kv::storage::memory::KvStore;
use quorum_kv::storage::protocol::{
    ENDPOINT_DUMP, ENDPOINT_DUMP_VERSIONS, ENDPOINT_GET, ENDPOINT_HEALTH, ENDPOINT_STATS,
};
use quorum_kv::storage::version::VersionSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Arc::new(NodeConfig::from_env()?);
    tracing::info!(
        "Starting {} node on {} ({} follower(s), quorum {})",
        config.role,
        config.http_addr,
        config.followers.len(),
        config.write_quorum
    );
    if !config.use_versioning {
        tracing::warn!("Versioning disabled: followers apply writes in arrival order");
    }

    let store = Arc::new(KvStore::new(config.use_versioning));
    let settings = Arc::new(RuntimeSettings::new(
        config.write_quorum,
        config.min_delay_ms,
        config.max_delay_ms,
    ));
    let versions = Arc::new(VersionSource::new(config.version_policy));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Read surface, exposed by every node:
    let mut app = Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(&format!("{}/:key", ENDPOINT_GET), get(handle_get))
        .route(ENDPOINT_DUMP, get(handle_dump))
        .route(ENDPOINT_DUMP_VERSIONS, get(handle_dump_versions))
        .route(ENDPOINT_STATS, get(handle_stats));

    // Role-gated write surface:
    match config.role {
        NodeRole::Leader => {
            let client = Arc::new(ReplicationClient::new(settings.clone()));
            let writer = Arc::new(LeaderWriter::new(
                store.clone(),
                versions,
                client,
                config.followers.clone(),
                settings.clone(),
                config.follower_timeout_ms,
                shutdown_rx.clone(),
            ));

            app = app
                .route(ENDPOINT_SET, post(handle_set))
                .route(ENDPOINT_CONFIG, post(handle_config))
                .layer(Extension(writer));
        }
        NodeRole::Follower => {
            app = app.route(ENDPOINT_REPLICATE, post(handle_replicate));
        }
    }

    let app = app
        .layer(Extension(config.clone()))
        .layer(Extension(store))
        .layer(Extension(settings))
        .layer(Extension(shutdown_rx));

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!("HTTP server listening on {}", config.http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    Ok(())
}

/// Waits for Ctrl+C, then flips the process-wide shutdown signal so that
/// in-flight background replications stop sleeping and the server drains.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
}
