//! Read-Side API Handlers
//!
//! HTTP endpoints exposed by every node regardless of role: health, point
//! reads against the local store, and full snapshots. Reads are served from
//! whatever this node currently holds; on followers that is eventually
//! consistent by design.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use sysinfo::System;

use super::memory::KvStore;
use super::protocol::{HealthResponse, StatsResponse};
use crate::cluster::config::NodeConfig;
use crate::cluster::settings::RuntimeSettings;

pub async fn handle_health(
    Extension(config): Extension<Arc<NodeConfig>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        role: config.role.to_string(),
    })
}

/// Returns the stored value as a JSON string, or 404 when the key is absent.
pub async fn handle_get(
    Extension(store): Extension<Arc<KvStore>>,
    Path(key): Path<String>,
) -> Response {
    match store.get(&key) {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => (StatusCode::NOT_FOUND, format!("key '{}' not found", key)).into_response(),
    }
}

pub async fn handle_dump(
    Extension(store): Extension<Arc<KvStore>>,
) -> Json<BTreeMap<String, String>> {
    Json(store.dump())
}

pub async fn handle_dump_versions(
    Extension(store): Extension<Arc<KvStore>>,
) -> Json<BTreeMap<String, u64>> {
    Json(store.dump_versions())
}

pub async fn handle_stats(
    Extension(store): Extension<Arc<KvStore>>,
    Extension(settings): Extension<Arc<RuntimeSettings>>,
    Extension(config): Extension<Arc<NodeConfig>>,
) -> Json<StatsResponse> {
    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo returns bytes for memory values.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    Json(StatsResponse {
        role: config.role.to_string(),
        entries: store.len(),
        write_quorum: settings.write_quorum(),
        min_delay_ms: settings.min_delay_ms(),
        max_delay_ms: settings.max_delay_ms(),
        followers: config.followers.len(),
        cpu_usage,
        mem_used_mb,
        mem_total_mb,
    })
}
