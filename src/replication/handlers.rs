//! Write-Side API Handlers
//!
//! The leader's client-facing write and reconfiguration endpoints, and the
//! follower's replication receiver. Role gating happens at router
//! construction in `main`; a follower simply never registers `/set` or
//! `/config`, and the leader never registers `/replicate`.

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::watch;

use super::protocol::{
    ConfigResponse, ConfigUpdate, ReplicateAck, ReplicateCommand, SetParams, SetResponse,
};
use super::writer::LeaderWriter;
use crate::cluster::config::NodeConfig;
use crate::cluster::error::ClusterError;
use crate::cluster::settings::RuntimeSettings;
use crate::storage::memory::KvStore;

fn error_status(error: &ClusterError) -> StatusCode {
    match error {
        ClusterError::InvalidInput(_) | ClusterError::InvalidConfiguration(_) => {
            StatusCode::BAD_REQUEST
        }
        ClusterError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ClusterError::ReplicationFailure(_) | ClusterError::ReplicationTimeout => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Leader write endpoint.
///
/// Success only reports that enough followers acknowledged in time; the write
/// is applied locally and keeps replicating in the background either way.
pub async fn handle_set(
    Extension(writer): Extension<Arc<LeaderWriter>>,
    Extension(shutdown): Extension<watch::Receiver<bool>>,
    Query(params): Query<SetParams>,
) -> Response {
    match writer.write(&params.key, params.value, shutdown).await {
        Ok(result) => (
            StatusCode::OK,
            Json(SetResponse {
                success: result.success,
                quorum: result.quorum,
                acks: result.acks,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Write rejected: {}", e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

/// Runtime reconfiguration: quorum and delay bounds. Values are validated
/// against the fixed follower list before anything is applied, so a rejected
/// update leaves every parameter untouched.
pub async fn handle_config(
    Extension(settings): Extension<Arc<RuntimeSettings>>,
    Extension(config): Extension<Arc<NodeConfig>>,
    Json(update): Json<ConfigUpdate>,
) -> Response {
    if let Some(quorum) = update.write_quorum {
        let follower_count = config.followers.len();
        if quorum < 1 || quorum > follower_count {
            let error = ClusterError::InvalidConfiguration(format!(
                "writeQuorum must be between 1 and {}, got {}",
                follower_count, quorum
            ));
            tracing::error!("Config update rejected: {}", error);
            return (error_status(&error), error.to_string()).into_response();
        }
    }

    if let Some(quorum) = update.write_quorum {
        settings.set_write_quorum(quorum);
    }
    if let Some(millis) = update.min_delay_ms {
        settings.set_min_delay_ms(millis);
    }
    if let Some(millis) = update.max_delay_ms {
        settings.set_max_delay_ms(millis);
    }

    tracing::info!(
        "Runtime config now quorum={} delay=[{}ms, {}ms]",
        settings.write_quorum(),
        settings.min_delay_ms(),
        settings.max_delay_ms()
    );

    (
        StatusCode::OK,
        Json(ConfigResponse {
            write_quorum: settings.write_quorum(),
            min_delay_ms: settings.min_delay_ms(),
            max_delay_ms: settings.max_delay_ms(),
            followers: config.followers.len(),
        }),
    )
        .into_response()
}

/// Follower replication receiver.
///
/// Acknowledges only after the command has been committed to the local store.
/// A stale command is acknowledged too (`applied = false`); from the leader's
/// point of view delivery succeeded, which is exactly what makes resends and
/// reordering harmless.
pub async fn handle_replicate(
    Extension(store): Extension<Arc<KvStore>>,
    Json(command): Json<ReplicateCommand>,
) -> Response {
    let ReplicateCommand { key, value, version } = command;
    if key.is_empty() {
        let error = ClusterError::InvalidInput("key must not be empty".to_string());
        return (error_status(&error), error.to_string()).into_response();
    }

    let applied = store.set(&key, value, version);
    if applied {
        tracing::debug!("Applied replicated write: key='{}' version={}", key, version);
    } else {
        tracing::debug!(
            "Ignored stale replicated write: key='{}' version={}",
            key,
            version
        );
    }

    (StatusCode::OK, Json(ReplicateAck { applied })).into_response()
}
