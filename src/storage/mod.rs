//! Versioned Storage Module
//!
//! The shared state layer of the node.
//!
//! ## Core Concepts
//! - **Monotone arbitration**: every entry carries the version the leader
//!   stamped on it; a write only lands if its version is strictly greater
//!   than what is stored (`KvStore::set`).
//! - **Version issue**: the leader's `VersionSource` hands out labels, either
//!   a strict counter or raw wall-clock millis.
//! - **Access**: read handlers serve point lookups and snapshots from the
//!   local map only; no node ever reads through to another.

pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod version;
