//! Read-Side Network Protocol
//!
//! Endpoint paths and response shapes for the surface every node exposes:
//! health, point reads and whole-store snapshots. Write and replication
//! traffic lives in `replication::protocol`.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Liveness and role probe.
pub const ENDPOINT_HEALTH: &str = "/health";
/// Point read for a single key.
pub const ENDPOINT_GET: &str = "/get";
/// Snapshot of every `(key, value)` pair on this node.
pub const ENDPOINT_DUMP: &str = "/dump";
/// Snapshot of every `(key, version)` pair on this node.
pub const ENDPOINT_DUMP_VERSIONS: &str = "/dump-versions";
/// Node statistics (entry counts, effective config, host resources).
pub const ENDPOINT_STATS: &str = "/stats";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub role: String,
}

/// Point-in-time view of one node, in the shape the cluster dashboards read.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub role: String,
    pub entries: usize,
    pub write_quorum: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub followers: usize,
    pub cpu_usage: f32,
    pub mem_used_mb: u64,
    pub mem_total_mb: u64,
}
