//! Database configuration
//!
//! Loaded from a JSON file or built in code. Every field has a default, so
//! `{}` is a valid configuration file.
//!
//! ```json
//! { "sync_mode": "fsync", "verify_checksums": true, "log_level": "WARN" }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DbError, Result};
use crate::observability::Severity;
use crate::storage::SyncMode;

/// Options for [`crate::Database::open_with_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    /// Durability of each data log append and index sync (default `fsync`)
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Verify frame checksums on data log reads (default true)
    #[serde(default = "default_verify_checksums")]
    pub verify_checksums: bool,

    /// Minimum severity written by the logger (default `WARN`)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_verify_checksums() -> bool {
    true
}

fn default_log_level() -> Severity {
    Severity::Warn
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            verify_checksums: default_verify_checksums(),
            log_level: default_log_level(),
        }
    }
}

impl DbConfig {
    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DbError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parses configuration JSON.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DbError::Config(format!("Invalid config JSON: {}", e)))
    }

    /// Config that only flushes, for throwaway databases and tests.
    pub fn relaxed() -> Self {
        Self {
            sync_mode: SyncMode::Flush,
            ..Self::default()
        }
    }
}
