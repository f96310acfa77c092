// Configuration for the ranked-term store
// Loaded from an optional TOML file, then overridden by environment variables

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Env var naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "RANKED_TERMS_CONFIG";
/// Env var overriding `db_path`
pub const DB_PATH_ENV: &str = "RANKED_TERMS_DB_PATH";
/// Env var overriding `admin_password`
pub const ADMIN_PASSWORD_ENV: &str = "RANKED_TERMS_ADMIN_PASSWORD";

/// Placeholder admin password; deployments are expected to override it
pub const DEFAULT_ADMIN_PASSWORD: &str = "change-me";
pub const DEFAULT_MAX_ENTRIES: usize = 50;
pub const DEFAULT_LIST_LIMIT: usize = 30;
pub const DEFAULT_STATS_TOP_LIMIT: usize = 10;

/// Ranked-term store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Location of the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Capacity bound; lowest-ranked terms are evicted beyond it
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Limit used by `list` when the caller gives none
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,

    /// Number of terms reported in `stats().top_terms`
    #[serde(default = "default_stats_top_limit")]
    pub stats_top_limit: usize,

    /// Shared secret for admin deletes and clears
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Terms longer than this (in chars, after trimming) are ignored.
    /// `None` means no limit.
    #[serde(default)]
    pub max_term_length: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_entries: default_max_entries(),
            default_list_limit: default_list_limit(),
            stats_top_limit: default_stats_top_limit(),
            admin_password: default_admin_password(),
            max_term_length: None,
        }
    }
}

impl StoreConfig {
    /// Load from `$RANKED_TERMS_CONFIG` if it points at an existing file,
    /// otherwise start from defaults. Env overrides are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
            Some(path) if path.exists() => Self::parse_file(&path)?,
            _ => StoreConfig::default(),
        };
        config.apply_env_overrides();
        config.validate()
    }

    /// Load a specific TOML file, then apply env overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        config.validate()
    }

    /// Defaults with env overrides applied; used when a config file is unusable
    pub fn from_env() -> Self {
        let mut config = StoreConfig::default();
        config.apply_env_overrides();
        config
    }

    /// Parse TOML text without touching the environment
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Some(path) = env::var_os(DB_PATH_ENV) {
            if !path.is_empty() {
                self.db_path = PathBuf::from(path);
            }
        }
        if let Ok(password) = env::var(ADMIN_PASSWORD_ENV) {
            if !password.is_empty() {
                self.admin_password = password;
            }
        }
    }

    /// Reject unusable bounds; clamp the ones that can be clamped
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid("max_entries must be at least 1".to_string()));
        }
        if self.max_term_length == Some(0) {
            return Err(ConfigError::Invalid("max_term_length must be at least 1".to_string()));
        }
        self.default_list_limit = self.default_list_limit.min(self.max_entries);
        self.stats_top_limit = self.stats_top_limit.min(self.max_entries);
        Ok(self)
    }

    /// Whether the admin password is still the shipped placeholder
    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(base) => base.join("ranked-terms").join("terms.db"),
        None => Path::new("data").join("terms.db"),
    }
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

fn default_stats_top_limit() -> usize {
    DEFAULT_STATS_TOP_LIMIT
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}
