// SQLite-backed term store
// Increments are one INSERT .. ON CONFLICT statement; eviction is one DELETE

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::backend::{BackendKind, TermBackend};
use super::record::TermRecord;
use crate::error::{BackendInitError, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS search_terms (
    term TEXT PRIMARY KEY NOT NULL,
    score INTEGER NOT NULL DEFAULT 1,
    last_accessed INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_terms_rank
    ON search_terms(score DESC, last_accessed DESC);
";

const UPSERT_SQL: &str = "
INSERT INTO search_terms (term, score, last_accessed, created_at)
VALUES (?1, 1, ?2, ?2)
ON CONFLICT(term) DO UPDATE SET
    score = score + 1,
    last_accessed = MAX(last_accessed, excluded.last_accessed)
";

// Keep the ORDER BY in both statements identical to `rank_order`
const RANKED_SQL: &str = "
SELECT term, score, last_accessed, created_at
FROM search_terms
ORDER BY score DESC, last_accessed DESC, term ASC
LIMIT ?1
";

const EVICT_SQL: &str = "
DELETE FROM search_terms
WHERE term NOT IN (
    SELECT term FROM search_terms
    ORDER BY score DESC, last_accessed DESC, term ASC
    LIMIT ?1
)
";

/// Term backend persisted in an embedded SQLite database
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    /// `None` for in-memory databases
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`, creating the parent directory
    /// if needed and bootstrapping the schema.
    ///
    /// # Errors
    /// Any failure in that sequence is returned as [`BackendInitError`].
    pub fn open(path: &Path) -> Result<Self, BackendInitError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| BackendInitError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| BackendInitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::apply_pragmas(&conn).map_err(|source| BackendInitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch(SCHEMA_SQL).map_err(BackendInitError::Schema)?;

        debug!(path = %path.display(), "opened term database");
        Ok(SqliteBackend {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database with the same schema
    ///
    /// # Errors
    /// Returns [`BackendInitError`] if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, BackendInitError> {
        let conn = Connection::open_in_memory().map_err(|source| BackendInitError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        conn.execute_batch(SCHEMA_SQL).map_err(BackendInitError::Schema)?;
        Ok(SqliteBackend {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn apply_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
        // journal_mode answers with the resulting mode
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    }

    /// Database file location, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn row_to_record(row: &Row<'_>) -> Result<TermRecord, rusqlite::Error> {
        let score: i64 = row.get(1)?;
        Ok(TermRecord {
            term: row.get(0)?,
            score: u64::try_from(score).unwrap_or(0),
            last_accessed: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

impl TermBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Durable
    }

    fn upsert_increment(&self, term: &str, now: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.prepare_cached(UPSERT_SQL)?
            .execute(params![term, now])?;
        Ok(())
    }

    fn ranked_top(&self, limit: usize) -> Result<Vec<TermRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(RANKED_SQL)?;
        let rows = stmt.query_map(params![sql_limit(limit)], Self::row_to_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn get(&self, term: &str) -> Result<Option<TermRecord>, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT term, score, last_accessed, created_at FROM search_terms WHERE term = ?1",
                params![term],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM search_terms", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn delete_one(&self, term: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM search_terms WHERE term = ?1", params![term])?;
        Ok(changed)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM search_terms", [])?;
        Ok(changed)
    }

    fn enforce_capacity(&self, max_entries: usize) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let evicted = conn
            .prepare_cached(EVICT_SQL)?
            .execute(params![sql_limit(max_entries)])?;
        Ok(evicted)
    }

    fn size_on_disk(&self) -> u64 {
        let Some(path) = self.path.as_deref() else {
            return 0;
        };
        let mut wal: OsString = path.as_os_str().to_owned();
        wal.push("-wal");
        file_len(path) + file_len(Path::new(&wal))
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        let SqliteBackend { conn, path } = *self;
        conn.into_inner()
            .close()
            .map_err(|(_, err)| StoreError::Query(err))?;
        if let Some(path) = path {
            debug!(path = %path.display(), "closed term database");
        }
        Ok(())
    }
}
