// Storage contract for ranked terms

use serde::Serialize;

use super::record::TermRecord;
use crate::error::StoreError;

/// Which storage medium a backend uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded SQLite; survives restarts
    Durable,
    /// Process memory; lost on restart
    Transient,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Transient => "transient",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Term storage interface.
///
/// Every implementation must produce the same ranking (see
/// [`rank_order`](super::record::rank_order)) and the same eviction for the
/// same sequence of calls. Implementations synchronize internally; a single
/// handle is shared by concurrent callers.
pub trait TermBackend: Send + Sync {
    /// Storage medium of this backend.
    fn kind(&self) -> BackendKind;

    /// Create `term` with score 1, or bump its score and set its last access
    /// to `now`. Must be atomic per term: concurrent calls never lose an
    /// increment.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn upsert_increment(&self, term: &str, now: i64) -> Result<(), StoreError>;

    /// Up to `limit` records in ranking order.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn ranked_top(&self, limit: usize) -> Result<Vec<TermRecord>, StoreError>;

    /// Point lookup of one term.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn get(&self, term: &str) -> Result<Option<TermRecord>, StoreError>;

    /// Total number of records.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn count(&self) -> Result<usize, StoreError>;

    /// Remove `term`; returns 1 if it existed, 0 otherwise.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn delete_one(&self, term: &str) -> Result<usize, StoreError>;

    /// Remove every record; returns how many were removed.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn delete_all(&self) -> Result<usize, StoreError>;

    /// Drop the lowest-ranked records until at most `max_entries` remain.
    /// Returns how many were evicted.
    ///
    /// # Errors
    /// Returns `StoreError` on a storage fault.
    fn enforce_capacity(&self, max_entries: usize) -> Result<usize, StoreError>;

    /// Bytes of persisted state; 0 for non-persistent backends.
    fn size_on_disk(&self) -> u64;

    /// Release the underlying resources.
    ///
    /// # Errors
    /// Returns `StoreError` if the engine reports a failure while closing.
    fn close(self: Box<Self>) -> Result<(), StoreError>;
}
