// Ranked-term service
// Owns one backend chosen at open; storage faults become degraded answers

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::auth::AdminSecret;
use super::backend::{BackendKind, TermBackend};
use super::clock::{Clock, SystemClock};
use super::durable::SqliteBackend;
use super::moderation::{ModerationFilter, PatternFilter};
use super::record::{normalize_term, TermRecord};
use super::transient::MemoryBackend;
use crate::config::StoreConfig;
use crate::error::StoreError;

/// What happened to a `record` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Stored (created or incremented)
    Recorded,
    /// Empty, whitespace-only or over-length term
    Ignored,
    /// Matched a moderation rule
    Rejected,
    /// Storage fault or closed store
    Failed,
}

/// Aggregate view returned by `stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermStats {
    pub total: usize,
    pub top_terms: Vec<TermRecord>,
}

/// Result of an admin operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOutcome {
    pub success: bool,
    pub message: String,
}

impl AdminOutcome {
    fn ok(message: impl Into<String>) -> Self {
        AdminOutcome {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        AdminOutcome {
            success: false,
            message: message.into(),
        }
    }
}

pub const MSG_INCORRECT_PASSWORD: &str = "incorrect password";
pub const MSG_TERM_NOT_FOUND: &str = "term not found";
pub const MSG_STORAGE_ERROR: &str = "storage error";
pub const MSG_CLOSED: &str = "store is closed";

/// Tunables the service applies on top of its backend
#[derive(Debug, Clone)]
pub struct ServiceLimits {
    pub max_entries: usize,
    pub default_list_limit: usize,
    pub stats_top_limit: usize,
    pub max_term_length: Option<usize>,
}

impl From<&StoreConfig> for ServiceLimits {
    fn from(config: &StoreConfig) -> Self {
        ServiceLimits {
            max_entries: config.max_entries,
            default_list_limit: config.default_list_limit.min(config.max_entries),
            stats_top_limit: config.stats_top_limit.min(config.max_entries),
            max_term_length: config.max_term_length,
        }
    }
}

impl Default for ServiceLimits {
    fn default() -> Self {
        ServiceLimits::from(&StoreConfig::default())
    }
}

/// Popularity store for search terms
pub struct RankedTermService {
    /// `None` once closed
    backend: RwLock<Option<Box<dyn TermBackend>>>,
    filter: Box<dyn ModerationFilter>,
    secret: AdminSecret,
    clock: Box<dyn Clock>,
    limits: ServiceLimits,
}

impl RankedTermService {
    /// Open the SQLite store at `config.db_path`, falling back to memory if it
    /// cannot be initialised. Never fails.
    pub fn open(config: &StoreConfig) -> Self {
        if config.uses_default_password() {
            warn!("admin password is the built-in placeholder; set admin_password or RANKED_TERMS_ADMIN_PASSWORD");
        }

        let backend: Box<dyn TermBackend> = match SqliteBackend::open(&config.db_path) {
            Ok(durable) => {
                info!(path = %config.db_path.display(), "term store using durable backend");
                Box::new(durable)
            }
            Err(err) => {
                warn!(
                    path = %config.db_path.display(),
                    error = %err,
                    "durable term store unavailable, falling back to in-memory backend"
                );
                Box::new(MemoryBackend::new())
            }
        };

        RankedTermService::new(backend, &config.admin_password, ServiceLimits::from(config))
    }

    /// Service over an already-built backend, with the default rule set and
    /// the system clock
    pub fn new(backend: Box<dyn TermBackend>, admin_password: &str, limits: ServiceLimits) -> Self {
        RankedTermService {
            backend: RwLock::new(Some(backend)),
            filter: Box::new(PatternFilter::with_default_rules()),
            secret: AdminSecret::new(admin_password),
            clock: Box::new(SystemClock::new()),
            limits,
        }
    }

    /// Swap the moderation rule set
    pub fn with_filter(mut self, filter: impl ModerationFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Swap the timestamp source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn limits(&self) -> &ServiceLimits {
        &self.limits
    }

    /// Backend in use, or `None` once closed
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.read().as_ref().map(|backend| backend.kind())
    }

    pub fn is_closed(&self) -> bool {
        self.backend.read().is_none()
    }

    fn with_backend<T>(&self, f: impl FnOnce(&dyn TermBackend) -> Result<T, StoreError>) -> Result<T, StoreError> {
        match self.backend.read().as_deref() {
            Some(backend) => f(backend),
            None => Err(StoreError::Closed),
        }
    }

    /// Count one use of `term`.
    ///
    /// Blank terms and moderated terms are silently dropped. Storage faults are
    /// logged, never returned; the outcome is informational only.
    pub fn record(&self, term: &str) -> RecordOutcome {
        let Some(term) = normalize_term(term) else {
            return RecordOutcome::Ignored;
        };
        if let Some(max) = self.limits.max_term_length {
            if term.chars().count() > max {
                debug!(max, "ignoring over-length term");
                return RecordOutcome::Ignored;
            }
        }
        if let Some(category) = self.filter.check(term) {
            debug!(category = category.as_str(), "dropping moderated term");
            return RecordOutcome::Rejected;
        }

        let now = self.clock.now_millis();
        let max_entries = self.limits.max_entries;
        let result = self.with_backend(|backend| {
            backend.upsert_increment(term, now)?;
            match backend.enforce_capacity(max_entries) {
                Ok(0) => {}
                Ok(evicted) => debug!(evicted, max_entries, "evicted lowest-ranked terms"),
                Err(err) => warn!(error = %err, "capacity enforcement failed"),
            }
            Ok(())
        });

        match result {
            Ok(()) => RecordOutcome::Recorded,
            Err(err) => {
                warn!(term, error = %err, "failed to record term");
                RecordOutcome::Failed
            }
        }
    }

    /// Top terms with the configured default limit
    pub fn list_default(&self) -> Vec<TermRecord> {
        self.list(self.limits.default_list_limit)
    }

    /// Up to `limit` terms in ranking order; `limit` is clamped to the capacity
    pub fn list(&self, limit: usize) -> Vec<TermRecord> {
        let limit = limit.min(self.limits.max_entries);
        self.with_backend(|backend| backend.ranked_top(limit))
            .unwrap_or_else(|err| {
                warn!(limit, error = %err, "failed to list terms");
                Vec::new()
            })
    }

    /// Terms starting with `prefix` (case-insensitive), in ranking order
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<TermRecord> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return self.list(limit);
        }
        let limit = limit.min(self.limits.max_entries);
        self.list(self.limits.max_entries)
            .into_iter()
            .filter(|record| record.term.to_lowercase().starts_with(&prefix))
            .take(limit)
            .collect()
    }

    /// Current record for `term`, if stored
    pub fn lookup(&self, term: &str) -> Option<TermRecord> {
        let term = normalize_term(term)?;
        self.with_backend(|backend| backend.get(term))
            .unwrap_or_else(|err| {
                warn!(term, error = %err, "failed to look up term");
                None
            })
    }

    /// Total count plus the top few terms
    pub fn stats(&self) -> TermStats {
        let total = self.with_backend(|backend| backend.count()).unwrap_or_else(|err| {
            warn!(error = %err, "failed to count terms");
            0
        });
        let top_terms = self.list(self.limits.stats_top_limit);
        TermStats { total, top_terms }
    }

    /// Delete one term, if `secret` is the admin password
    pub fn admin_delete(&self, term: &str, secret: &str) -> AdminOutcome {
        if !self.secret.verify(secret) {
            warn!("admin delete rejected: incorrect password");
            return AdminOutcome::fail(MSG_INCORRECT_PASSWORD);
        }
        let Some(term) = normalize_term(term) else {
            return AdminOutcome::fail(MSG_TERM_NOT_FOUND);
        };

        match self.with_backend(|backend| backend.delete_one(term)) {
            Ok(0) => AdminOutcome::fail(MSG_TERM_NOT_FOUND),
            Ok(_) => {
                info!(term, "admin deleted term");
                AdminOutcome::ok(format!("deleted term \"{term}\""))
            }
            Err(StoreError::Closed) => AdminOutcome::fail(MSG_CLOSED),
            Err(err) => {
                warn!(term, error = %err, "admin delete failed");
                AdminOutcome::fail(MSG_STORAGE_ERROR)
            }
        }
    }

    /// Delete every term, if `secret` is the admin password
    pub fn admin_clear(&self, secret: &str) -> AdminOutcome {
        if !self.secret.verify(secret) {
            warn!("admin clear rejected: incorrect password");
            return AdminOutcome::fail(MSG_INCORRECT_PASSWORD);
        }

        match self.with_backend(|backend| backend.delete_all()) {
            Ok(removed) => {
                info!(removed, "admin cleared term store");
                AdminOutcome::ok(format!("cleared {removed} terms"))
            }
            Err(StoreError::Closed) => AdminOutcome::fail(MSG_CLOSED),
            Err(err) => {
                warn!(error = %err, "admin clear failed");
                AdminOutcome::fail(MSG_STORAGE_ERROR)
            }
        }
    }

    /// Bytes of persisted state; 0 for the memory backend or once closed
    pub fn database_size(&self) -> u64 {
        self.backend
            .read()
            .as_ref()
            .map(|backend| backend.size_on_disk())
            .unwrap_or(0)
    }

    /// Release the backend. Later calls degrade as if the store were empty.
    pub fn close(&self) {
        let Some(backend) = self.backend.write().take() else {
            return;
        };
        let kind = backend.kind();
        match backend.close() {
            Ok(()) => info!(backend = %kind, "term store closed"),
            Err(err) => warn!(backend = %kind, error = %err, "error while closing term store"),
        }
    }
}

impl Drop for RankedTermService {
    fn drop(&mut self) {
        self.close();
    }
}
