use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process-wide role, fixed at startup.
///
/// The role decides which endpoints the node exposes: only the leader accepts
/// client writes and runtime reconfiguration, only followers accept
/// replication commands. Reads are served by both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeRole {
    Leader,
    Follower,
}

impl FromStr for NodeRole {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "leader" => Ok(NodeRole::Leader),
            "follower" => Ok(NodeRole::Follower),
            other => Err(format!("unknown node role '{}'", other)),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Leader => write!(f, "Leader"),
            NodeRole::Follower => write!(f, "Follower"),
        }
    }
}

/// Base address of one follower, e.g. `http://localhost:8081`.
///
/// Stored without a trailing slash so endpoint paths can be appended directly.
/// Duplicate addresses are allowed and treated as distinct replication targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerAddr(String);

impl FollowerAddr {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FollowerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
