// In-memory term backend
// Fallback when SQLite cannot be opened; same ranking and eviction rules

use std::collections::HashMap;

use parking_lot::Mutex;

use super::backend::{BackendKind, TermBackend};
use super::record::{rank_order, sort_ranked, TermRecord};
use crate::error::StoreError;

/// Term backend holding records in a map
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, TermRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl TermBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Transient
    }

    fn upsert_increment(&self, term: &str, now: i64) -> Result<(), StoreError> {
        // Read and write happen under one guard
        let mut records = self.records.lock();
        match records.get_mut(term) {
            Some(record) => record.touch(now),
            None => {
                records.insert(term.to_string(), TermRecord::first_seen(term, now));
            }
        }
        Ok(())
    }

    fn ranked_top(&self, limit: usize) -> Result<Vec<TermRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut ranked: Vec<TermRecord> = self.records.lock().values().cloned().collect();
        sort_ranked(&mut ranked);
        ranked.truncate(limit);
        Ok(ranked)
    }

    fn get(&self, term: &str) -> Result<Option<TermRecord>, StoreError> {
        Ok(self.records.lock().get(term).cloned())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().len())
    }

    fn delete_one(&self, term: &str) -> Result<usize, StoreError> {
        Ok(usize::from(self.records.lock().remove(term).is_some()))
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let mut records = self.records.lock();
        let removed = records.len();
        records.clear();
        Ok(removed)
    }

    fn enforce_capacity(&self, max_entries: usize) -> Result<usize, StoreError> {
        let mut records = self.records.lock();
        if records.len() <= max_entries {
            return Ok(0);
        }

        let mut ranked: Vec<&TermRecord> = records.values().collect();
        ranked.sort_by(|a, b| rank_order(a, b));
        let evicted: Vec<String> = ranked[max_entries..]
            .iter()
            .map(|record| record.term.clone())
            .collect();

        for term in &evicted {
            records.remove(term);
        }
        Ok(evicted.len())
    }

    fn size_on_disk(&self) -> u64 {
        0
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_then_increments() {
        let backend = MemoryBackend::new();
        backend.upsert_increment("rust", 100).unwrap();
        backend.upsert_increment("rust", 200).unwrap();

        let record = backend.get("rust").unwrap().unwrap();
        assert_eq!(record.score, 2);
        assert_eq!(record.created_at, 100);
        assert_eq!(record.last_accessed, 200);
        assert_eq!(backend.count().unwrap(), 1);
    }

    #[test]
    fn test_terms_are_case_sensitive() {
        let backend = MemoryBackend::new();
        backend.upsert_increment("Rust", 1).unwrap();
        backend.upsert_increment("rust", 2).unwrap();
        assert_eq!(backend.count().unwrap(), 2);
    }

    #[test]
    fn test_enforce_capacity_drops_lowest_ranked() {
        let backend = MemoryBackend::new();
        backend.upsert_increment("popular", 1).unwrap();
        backend.upsert_increment("popular", 2).unwrap();
        backend.upsert_increment("old", 3).unwrap();
        backend.upsert_increment("new", 4).unwrap();

        assert_eq!(backend.enforce_capacity(2).unwrap(), 1);
        assert!(backend.get("old").unwrap().is_none());
        assert!(backend.get("popular").unwrap().is_some());
        assert!(backend.get("new").unwrap().is_some());

        // Already within bound
        assert_eq!(backend.enforce_capacity(2).unwrap(), 0);
    }

    #[test]
    fn test_ranked_top_zero_limit() {
        let backend = MemoryBackend::new();
        backend.upsert_increment("a", 1).unwrap();
        assert!(backend.ranked_top(0).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let backend = MemoryBackend::new();
        backend.upsert_increment("a", 1).unwrap();
        backend.upsert_increment("b", 2).unwrap();

        assert_eq!(backend.delete_one("missing").unwrap(), 0);
        assert_eq!(backend.delete_one("a").unwrap(), 1);
        assert_eq!(backend.delete_all().unwrap(), 1);
        assert_eq!(backend.count().unwrap(), 0);
        assert_eq!(backend.size_on_disk(), 0);
    }
}
