//! Replication Network Protocol
//!
//! Endpoint paths and DTOs for write traffic: client writes into the leader,
//! replication commands from the leader to followers, and the runtime
//! reconfiguration surface.
//!
//! The replication command uses PascalCase field names on the wire; that is
//! the format the experiment tooling speaks, and both sides must agree.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Leader-only client write endpoint (`?key=K&value=V`).
pub const ENDPOINT_SET: &str = "/set";
/// Leader-only runtime reconfiguration endpoint.
pub const ENDPOINT_CONFIG: &str = "/config";
/// Follower-only endpoint receiving replication commands from the leader.
pub const ENDPOINT_REPLICATE: &str = "/replicate";

// --- Data Transfer Objects ---

/// One row-level change shipped from the leader to a follower.
///
/// Carries the version the leader stamped on the write so the follower can
/// arbitrate reordered deliveries; resending the same command any number of
/// times is safe because the follower's monotone store ignores non-advancing
/// versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicateCommand {
    pub key: String,
    pub value: String,
    pub version: u64,
}

/// Acknowledgement returned by a follower once the command is in its store.
/// `applied = false` means the command was stale and suppressed, which is
/// still a successful delivery.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicateAck {
    pub applied: bool,
}

/// Query parameters of the client write endpoint.
#[derive(Debug, Deserialize)]
pub struct SetParams {
    pub key: String,
    pub value: String,
}

/// Client-visible outcome of a write: `success` iff `acks >= quorum` at the
/// moment the leader stopped waiting.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub success: bool,
    pub quorum: usize,
    pub acks: usize,
}

/// Partial update of the runtime parameters. Absent fields are left alone.
///
/// Field names are camelCase; the PascalCase aliases keep the original
/// experiment client working.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default, alias = "WriteQuorum")]
    pub write_quorum: Option<usize>,
    #[serde(default, alias = "MinDelayMs")]
    pub min_delay_ms: Option<u64>,
    #[serde(default, alias = "MaxDelayMs")]
    pub max_delay_ms: Option<u64>,
}

/// Effective configuration echoed back after an update.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub write_quorum: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub followers: usize,
}
