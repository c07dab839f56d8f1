use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::client::{ReplicaResponse, ReplicationClient, wait_cancelled};
use super::protocol::ReplicateCommand;
use crate::cluster::error::ClusterError;
use crate::cluster::settings::RuntimeSettings;
use crate::cluster::types::FollowerAddr;
use crate::storage::memory::KvStore;
use crate::storage::version::VersionSource;

/// Outcome of one leader write.
///
/// `responses` is a snapshot at the point the leader stopped waiting, in
/// completion order; sends still in flight at that moment are not in it even
/// though they keep running in the background.
#[derive(Debug)]
pub struct WriteResult {
    pub success: bool,
    pub quorum: usize,
    pub acks: usize,
    pub responses: Vec<ReplicaResponse>,
    pub cancelled: bool,
}

/// Orchestrates client writes on the leader: local apply, parallel fan-out,
/// quorum-gated wait.
///
/// The fan-out tasks are detached (`tokio::spawn`), so returning at the
/// quorum point, a client disconnect, or a cancel signal never stops a
/// replication that has already been launched. Followers that lose the
/// quorum race still receive the write; that is what keeps them converging.
/// Only the process-wide shutdown signal reaches into running sends, and only
/// during their injected-delay phase.
pub struct LeaderWriter {
    store: Arc<KvStore>,
    versions: Arc<VersionSource>,
    client: Arc<ReplicationClient>,
    followers: Vec<FollowerAddr>,
    settings: Arc<RuntimeSettings>,
    follower_timeout_ms: u64,
    shutdown: watch::Receiver<bool>,
}

impl LeaderWriter {
    pub fn new(
        store: Arc<KvStore>,
        versions: Arc<VersionSource>,
        client: Arc<ReplicationClient>,
        followers: Vec<FollowerAddr>,
        settings: Arc<RuntimeSettings>,
        follower_timeout_ms: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            versions,
            client,
            followers,
            settings,
            follower_timeout_ms,
            shutdown,
        }
    }

    /// Applies one client write.
    ///
    /// The local store is updated before any fan-out, so a read on the leader
    /// after `write` returns always observes the new value. The quorum and
    /// delay bounds are sampled once at entry; a concurrent `/config` update
    /// affects the next write, not this one.
    ///
    /// `cancel` aborts the wait for further acknowledgements. It does not
    /// abort the sends themselves.
    pub async fn write(
        &self,
        key: &str,
        value: String,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<WriteResult, ClusterError> {
        if key.is_empty() {
            return Err(ClusterError::InvalidInput(
                "key must not be empty".to_string(),
            ));
        }
        if *cancel.borrow() {
            return Err(ClusterError::Cancelled);
        }

        let op_id = Uuid::new_v4();
        let version = self.versions.next();
        self.store.set(key, value.clone(), version);
        tracing::debug!(
            "Write {} applied locally: key='{}' version={}",
            op_id,
            key,
            version
        );

        let quorum = self.settings.write_quorum();
        let follower_count = self.followers.len();
        if quorum > follower_count {
            return Err(ClusterError::InvalidConfiguration(format!(
                "write quorum {} exceeds follower count {}",
                quorum, follower_count
            )));
        }
        if quorum == 0 || follower_count == 0 {
            tracing::debug!("Write {} needs no acknowledgements", op_id);
            return Ok(WriteResult {
                success: true,
                quorum,
                acks: 0,
                responses: Vec::new(),
                cancelled: false,
            });
        }

        let command = ReplicateCommand {
            key: key.to_string(),
            value,
            version,
        };
        let mut rx = self.fan_out(&command);

        let mut responses = Vec::new();
        let mut acks = 0usize;
        let mut cancelled = false;

        while acks < quorum {
            tokio::select! {
                received = rx.recv() => {
                    match received {
                        Some(response) => {
                            if response.is_success() {
                                acks += 1;
                            }
                            responses.push(response);
                        }
                        // Every send has completed; the quorum is out of reach.
                        None => break,
                    }
                }
                _ = wait_cancelled(&mut cancel) => {
                    tracing::warn!("Write {} cancelled at {}/{} acks", op_id, acks, quorum);
                    cancelled = true;
                    break;
                }
            }
        }

        let success = acks >= quorum;
        tracing::info!(
            "Write {} key='{}' version={} quorum={} acks={} success={}",
            op_id,
            key,
            version,
            quorum,
            acks,
            success
        );

        Ok(WriteResult {
            success,
            quorum,
            acks,
            responses,
            cancelled,
        })
    }

    /// Launches one detached send per follower. Completions are reported over
    /// the returned channel; the channel's capacity matches the fan-out width
    /// so a send never blocks on a receiver that has already gone away.
    fn fan_out(&self, command: &ReplicateCommand) -> mpsc::Receiver<ReplicaResponse> {
        let (tx, rx) = mpsc::channel(self.followers.len());

        for follower in self.followers.clone() {
            let client = self.client.clone();
            let command = command.clone();
            let shutdown = self.shutdown.clone();
            let timeout_ms = self.follower_timeout_ms;
            let tx = tx.clone();

            tokio::spawn(async move {
                let send = client.send(&follower, &command, shutdown);
                let response = if timeout_ms > 0 {
                    match tokio::time::timeout(Duration::from_millis(timeout_ms), send).await {
                        Ok(response) => response,
                        Err(_) => {
                            tracing::warn!(
                                "Replication to {} exceeded {}ms",
                                follower,
                                timeout_ms
                            );
                            ReplicaResponse::Timeout
                        }
                    }
                } else {
                    send.await
                };

                if let ReplicaResponse::Failure(ref reason) = response {
                    tracing::warn!("Replication to {} failed: {}", follower, reason);
                }

                // The writer may have returned at the quorum point already;
                // a closed channel just means nobody is counting anymore.
                let _ = tx.send(response).await;
            });
        }

        rx
    }
}
