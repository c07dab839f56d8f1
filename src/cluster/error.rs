use thiserror::Error;

/// Error taxonomy for the replication core.
///
/// Per-follower failures and timeouts are never fatal to a write; they are
/// carried as `ReplicaResponse` entries in the write result and only surface
/// here when a single send needs to explain itself.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Bad key, value or request shape, rejected at the boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Requested quorum cannot be satisfied by the configured followers.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// One replication send failed at the transport level.
    #[error("replication failed: {0}")]
    ReplicationFailure(String),

    /// One replication send exceeded its time budget.
    #[error("replication timed out")]
    ReplicationTimeout,

    /// The caller's cancel signal fired before the operation started.
    #[error("operation cancelled")]
    Cancelled,
}
