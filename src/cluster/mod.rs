//! Cluster Topology & Configuration
//!
//! Holds the pieces every other subsystem leans on:
//! - **Roles**: a node is either the single `Leader` or one of N `Follower`s,
//!   fixed at startup. Role gating decides the HTTP surface.
//! - **Configuration**: startup parameters come from the environment
//!   (`NodeConfig`); the quorum and delay knobs stay mutable at runtime
//!   (`RuntimeSettings`) so experiments can be reconfigured live.
//! - **Errors**: the shared `ClusterError` taxonomy.

pub mod config;
pub mod error;
pub mod settings;
pub mod types;
