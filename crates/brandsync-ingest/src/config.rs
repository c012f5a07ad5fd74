//! Run configuration
//!
//! Resolved in layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (`brandsync.toml` when present, or `--config`)
//! 3. environment (`DATABASE_URL`, `BRANDSYNC_TABLE`, ...), `.env` included
//! 4. command-line flags

use brandsync_common::{BrandsyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::ImportMode;
use crate::gateway::TableName;
use crate::source::{EncodingChain, SourceOptions};

// ============================================================================
// Defaults
// ============================================================================

/// Canonical table when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "brand_presence";

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/brand_location";

/// Connection pool size; the run issues one statement at a time.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration file read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "brandsync.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Files processed when none are given on the command line
    pub source_files: Vec<PathBuf>,
    pub table_name: String,
    pub mode: ImportMode,
    pub database: DatabaseConfig,
    pub source: SourceOptions,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_files: Vec::new(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            mode: ImportMode::default(),
            database: DatabaseConfig::default(),
            source: SourceOptions::default(),
        }
    }
}

impl IngestConfig {
    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            },
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| BrandsyncError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|source| BrandsyncError::ConfigParse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Override fields from environment variables read through `var`
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(table) = var("BRANDSYNC_TABLE") {
            self.table_name = table;
        }
        if let Some(mode) = var("BRANDSYNC_MODE") {
            self.mode = mode.parse().map_err(BrandsyncError::Config)?;
        }
        if let Some(encodings) = var("BRANDSYNC_ENCODINGS") {
            self.source.encodings = encodings
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(max) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = max.parse().map_err(|_| {
                BrandsyncError::config(format!("DATABASE_MAX_CONNECTIONS is not a number: {}", max))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(BrandsyncError::config("Database URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(BrandsyncError::config("Database max_connections must be greater than 0"));
        }

        TableName::parse(&self.table_name)
            .map_err(|e| BrandsyncError::InvalidIdentifier(e.to_string()))?;

        if self.source.encodings.is_empty() {
            return Err(BrandsyncError::config("At least one source encoding is required"));
        }
        EncodingChain::from_labels(&self.source.encodings)
            .map_err(|label| BrandsyncError::config(format!("Unknown encoding: {}", label)))?;

        if !self.source.delimiter.is_ascii() {
            return Err(BrandsyncError::config(format!(
                "CSV delimiter must be a single ASCII character, got '{}'",
                self.source.delimiter
            )));
        }

        for (column, aliases) in self.source.headers.columns() {
            if aliases.iter().all(|alias| alias.trim().is_empty()) {
                return Err(BrandsyncError::config(format!(
                    "Header aliases for '{}' cannot be empty",
                    column
                )));
            }
        }

        Ok(())
    }
}
