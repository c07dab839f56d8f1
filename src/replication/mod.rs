//! Replication Module
//!
//! Implements the single-leader, semi-synchronous write path.
//!
//! ## Core Concepts
//! - **Fan-out**: the leader applies each write locally, then launches one
//!   detached send per follower in parallel (`LeaderWriter`).
//! - **Quorum**: the client gets its answer as soon as Q followers have
//!   acknowledged; the remaining sends finish in the background.
//! - **Injected delay**: every send sleeps a random interval first
//!   (`ReplicationClient`), making delivery reordering observable.
//! - **Follower apply**: followers push received commands into the versioned
//!   store and acknowledge after the mutation, never propagating further.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod writer;
