//! Error types shared across brandsync crates

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for brandsync operations
pub type Result<T> = std::result::Result<T, BrandsyncError>;

/// Workspace-level error type
///
/// Covers failures that happen before any file is processed (configuration,
/// logging setup). Per-file and per-row failures have their own types in the
/// ingest crate because they are counted rather than propagated.
#[derive(Error, Debug)]
pub enum BrandsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl BrandsyncError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
