use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeMap;

/// One stored row: the value together with the version the leader stamped on
/// the write that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEntry {
    pub value: String,
    pub version: u64,
}

/// Versioned concurrent key-value map shared by every request task.
///
/// Writes go through [`KvStore::set`], which applies the monotone rule: an
/// incoming `(value, version)` replaces the stored entry only when its
/// version is strictly greater. Because replication deliveries are reordered
/// on purpose (injected delay), this rule is what makes followers converge to
/// the leader's final state instead of whatever arrived last.
///
/// The `DashMap` entry API holds the shard lock across the compare and the
/// write, so concurrent `set` calls on one key serialize and readers never
/// observe a torn `(value, version)` pair.
pub struct KvStore {
    entries: DashMap<String, VersionedEntry>,
    versioned: bool,
}

impl KvStore {
    /// `versioned = false` selects the naive arrival-order store: every
    /// incoming write wins, versions are recorded but never compared. This
    /// deliberately violates per-key monotonicity and exists so the reorder
    /// hazard is observable in experiments. Never use it for real data.
    pub fn new(versioned: bool) -> Self {
        Self {
            entries: DashMap::new(),
            versioned,
        }
    }

    /// Applies a write under the monotone rule. Returns whether the entry
    /// changed; a `false` means the incoming version was stale (or a tie) and
    /// the existing entry was kept, which also makes replayed commands with
    /// the same version idempotent.
    pub fn set(&self, key: &str, value: String, version: u64) -> bool {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if self.versioned && version <= occupied.get().version {
                    return false;
                }
                occupied.insert(VersionedEntry { value, version });
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(VersionedEntry { value, version });
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().value.clone())
    }

    pub fn get_versioned(&self, key: &str) -> Option<VersionedEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Point-in-time snapshot of all `(key, value)` pairs. Not a consistent
    /// cut across keys; each entry is a real state that key held.
    pub fn dump(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect()
    }

    /// Snapshot of all `(key, version)` pairs, same caveats as [`dump`](Self::dump).
    pub fn dump_versions(&self) -> BTreeMap<String, u64> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().version))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
