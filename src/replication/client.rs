use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::protocol::{ENDPOINT_REPLICATE, ReplicateCommand};
use crate::cluster::error::ClusterError;
use crate::cluster::settings::RuntimeSettings;
use crate::cluster::types::FollowerAddr;

/// Terminal outcome of one replication send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaResponse {
    /// The follower acknowledged receipt.
    Success,
    /// The send was cut short: cancelled during the injected delay, or the
    /// transport gave up waiting.
    Timeout,
    /// The follower answered non-2xx, or the transport failed outright.
    Failure(String),
}

impl ReplicaResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ReplicaResponse::Success)
    }
}

/// Delivers single replication commands to single followers.
///
/// Before transmitting, each send sleeps for a uniform random duration drawn
/// from the runtime delay bounds. The delay simulates a slow or congested
/// link and is what makes out-of-order delivery reproducible in experiments.
/// The client never retries; the follower's monotone store makes external
/// resends safe.
pub struct ReplicationClient {
    http_client: reqwest::Client,
    settings: Arc<RuntimeSettings>,
}

impl ReplicationClient {
    pub fn new(settings: Arc<RuntimeSettings>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            settings,
        }
    }

    /// Sends one command to one follower.
    ///
    /// If `cancel` fires while the injected delay is still running, the send
    /// resolves to `Timeout` without transmitting anything. Once transmission
    /// has started the cancel signal is no longer consulted.
    pub async fn send(
        &self,
        follower: &FollowerAddr,
        command: &ReplicateCommand,
        mut cancel: watch::Receiver<bool>,
    ) -> ReplicaResponse {
        let (min, max) = self.settings.delay_range();
        if max > 0 {
            let delay = rand::thread_rng().gen_range(min..=max);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                _ = wait_cancelled(&mut cancel) => {
                    tracing::debug!(
                        "Send to {} cancelled during injected delay",
                        follower
                    );
                    return ReplicaResponse::Timeout;
                }
            }
        }

        match self.transmit(follower, command).await {
            Ok(()) => ReplicaResponse::Success,
            Err(ClusterError::ReplicationTimeout) => ReplicaResponse::Timeout,
            Err(e) => ReplicaResponse::Failure(e.to_string()),
        }
    }

    async fn transmit(
        &self,
        follower: &FollowerAddr,
        command: &ReplicateCommand,
    ) -> Result<(), ClusterError> {
        let url = format!("{}{}", follower.as_str(), ENDPOINT_REPLICATE);

        let response = self
            .http_client
            .post(url)
            .json(command)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClusterError::ReplicationTimeout
                } else {
                    ClusterError::ReplicationFailure(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClusterError::ReplicationFailure(format!(
                "{}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Resolves once `cancel` carries `true`. If the sender is gone the signal
/// can never fire, so the future stays pending forever.
pub(crate) async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
