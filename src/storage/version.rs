use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// How the leader labels its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Strictly increasing 1, 2, 3, … via atomic increment. With a single
    /// leader this totally orders all writes, so followers converge to the
    /// leader's final state no matter the delivery order.
    Counter,
    /// Wall-clock milliseconds since the epoch. Two writes in the same
    /// millisecond get equal versions and the store's "strictly greater
    /// replaces" rule keeps whichever arrived first. Kept as an experiment
    /// mode to show what breaks without a proper sequence.
    Timestamp,
}

impl FromStr for VersionPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(VersionPolicy::Counter),
            "timestamp" => Ok(VersionPolicy::Timestamp),
            other => Err(format!("unknown version policy '{}'", other)),
        }
    }
}

/// Issues write versions on the leader. One instance per process.
pub struct VersionSource {
    policy: VersionPolicy,
    counter: AtomicU64,
}

impl VersionSource {
    pub fn new(policy: VersionPolicy) -> Self {
        Self {
            policy,
            counter: AtomicU64::new(0),
        }
    }

    /// Returns the next version. Under the counter policy every return is
    /// unique across all callers in the process and strictly greater than
    /// every prior return; under the timestamp policy there is no such
    /// guarantee.
    pub fn next(&self) -> u64 {
        match self.policy {
            VersionPolicy::Counter => self.counter.fetch_add(1, Ordering::Relaxed) + 1,
            VersionPolicy::Timestamp => now_ms(),
        }
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
