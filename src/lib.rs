//! Single-Leader Replicated Key-Value Store Library
//!
//! This library crate defines the core modules of a pedagogical distributed
//! key-value store with semi-synchronous replication. It serves as the
//! foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of three loosely coupled subsystems:
//!
//! - **`cluster`**: Roles, startup configuration from the environment, the
//!   runtime-mutable quorum/delay settings, and the shared error taxonomy.
//! - **`storage`**: The versioned concurrent key-value map with monotone
//!   per-key arbitration, the leader's version source, and the read-side
//!   HTTP handlers every node exposes.
//! - **`replication`**: The write path. The leader applies locally, fans out
//!   to all followers in parallel with injected delay, and answers the client
//!   at the configured quorum; followers apply received commands through the
//!   monotone store and acknowledge.
//!
//! Writes flow strictly leader → follower; followers never call back. A
//! follower read is eventually consistent by design: convergence is restored
//! by versions, not by delivery order.

pub mod cluster;
pub mod replication;
pub mod storage;
