use anyhow::{Result, anyhow, bail};
use std::net::SocketAddr;
use std::str::FromStr;

use super::types::{FollowerAddr, NodeRole};
use crate::storage::version::VersionPolicy;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_WRITE_QUORUM: usize = 1;
const DEFAULT_FOLLOWER_TIMEOUT_MS: u64 = 2000;
const DEFAULT_MIN_DELAY_MS: u64 = 0;
const DEFAULT_MAX_DELAY_MS: u64 = 1000;

/// Startup configuration, read once from the environment.
///
/// `write_quorum`, `min_delay_ms` and `max_delay_ms` only seed the mutable
/// [`RuntimeSettings`](super::settings::RuntimeSettings); everything else is
/// fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub role: NodeRole,
    pub http_addr: SocketAddr,
    pub followers: Vec<FollowerAddr>,
    pub write_quorum: usize,
    pub follower_timeout_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub use_versioning: bool,
    pub version_policy: VersionPolicy,
}

impl NodeConfig {
    /// Reads and validates the node configuration from environment variables.
    ///
    /// An unset variable falls back to its default; a set-but-unparsable one
    /// is a startup failure, as is a leader quorum larger than the follower
    /// list. The caller turns the error into a non-zero exit.
    pub fn from_env() -> Result<Self> {
        let role: NodeRole = env_parse("NODE_ROLE", NodeRole::Leader)?;
        let http_addr: SocketAddr = env_parse("HTTP_ADDR", DEFAULT_HTTP_ADDR.parse()?)?;
        let write_quorum: usize = env_parse("WRITE_QUORUM", DEFAULT_WRITE_QUORUM)?;
        let follower_timeout_ms: u64 =
            env_parse("FOLLOWER_TIMEOUT_MS", DEFAULT_FOLLOWER_TIMEOUT_MS)?;
        let min_delay_ms: u64 = env_parse("MIN_DELAY_MS", DEFAULT_MIN_DELAY_MS)?;
        let max_delay_ms: u64 = env_parse("MAX_DELAY_MS", DEFAULT_MAX_DELAY_MS)?;
        let use_versioning = env_parse_bool("USE_VERSIONING", true)?;
        let version_policy: VersionPolicy = env_parse("VERSION_POLICY", VersionPolicy::Counter)?;

        let followers = match std::env::var("FOLLOWERS") {
            Ok(raw) => parse_followers(&raw),
            Err(_) => Vec::new(),
        };

        let config = Self {
            role,
            http_addr,
            followers,
            write_quorum,
            follower_timeout_ms,
            min_delay_ms,
            max_delay_ms,
            use_versioning,
            version_policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.role == NodeRole::Leader && self.write_quorum > self.followers.len() {
            bail!(
                "WRITE_QUORUM ({}) exceeds the number of configured followers ({})",
                self.write_quorum,
                self.followers.len()
            );
        }
        Ok(())
    }
}

/// Splits the semicolon-separated `FOLLOWERS` value into base addresses.
/// Empty segments (trailing semicolons, doubled separators) are skipped.
pub(crate) fn parse_followers(raw: &str) -> Vec<FollowerAddr> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(FollowerAddr::new)
        .collect()
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {}='{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

fn env_parse_bool(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(anyhow!("invalid {}='{}': expected a boolean", name, raw)),
        },
        Err(_) => Ok(default),
    }
}
