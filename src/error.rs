// Error types for the ranked-term store

use std::path::PathBuf;

use thiserror::Error;

/// Failure to bring up the durable backend.
///
/// Kept separate from [`StoreError`] so the service can tell "the engine never
/// came up" (fall back to memory) apart from a fault on a working store.
#[derive(Debug, Error)]
pub enum BackendInitError {
    #[error("failed to create storage directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open term database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to bootstrap term schema: {0}")]
    Schema(#[source] rusqlite::Error),
}

/// Runtime failure of a backend operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("term store is closed")]
    Closed,
}

/// Errors loading a [`StoreConfig`](crate::StoreConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
