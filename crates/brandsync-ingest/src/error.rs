//! Error taxonomy for the ingest pipeline
//!
//! Each error type corresponds to a failure scope:
//!
//! | Type | Scope |
//! |---|---|
//! | [`SourceError`] | one file is skipped, the run continues |
//! | [`RowError`] | one record is counted as errored, the file continues |
//! | [`CommitError`] | one file's batch is lost, the run continues |
//! | [`ConnectionError`] | the whole run is aborted |

use brandsync_common::RecordKey;
use std::path::PathBuf;
use thiserror::Error;

/// A source file could not be opened or interpreted
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("File not found: '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported source format for '{}'. Expected .csv, .txt, .xlsx, .xlsm, .xlsb, .xls or .ods", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Could not decode '{}' with any of the configured encodings ({})", path.display(), tried.join(", "))]
    Undecodable { path: PathBuf, tried: Vec<String> },

    #[error("Failed to parse CSV header of '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read workbook '{}': {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("'{}' has no header row", .0.display())]
    EmptySource(PathBuf),

    #[error("'{}' has {found} column(s); at least 4 are required (location, floor, name, category)", path.display())]
    TooFewColumns { path: PathBuf, found: usize },
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn workbook(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Workbook {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// A single record could not be read or applied
#[derive(Error, Debug)]
pub enum RowError {
    #[error("Row {row}: required field '{field}' is empty")]
    MissingField { row: usize, field: &'static str },

    #[error("Row {row}: field '{field}' could not be read ({detail})")]
    UnreadableField {
        row: usize,
        field: &'static str,
        detail: String,
    },

    #[error("Row {row}: malformed record: {message}")]
    Malformed { row: usize, message: String },

    #[error("Row {row} ({key}): {source}")]
    Gateway {
        row: usize,
        key: RecordKey,
        #[source]
        source: GatewayError,
    },
}

impl RowError {
    /// 1-based data row the error refers to
    pub fn row(&self) -> usize {
        match self {
            RowError::MissingField { row, .. }
            | RowError::UnreadableField { row, .. }
            | RowError::Malformed { row, .. }
            | RowError::Gateway { row, .. } => *row,
        }
    }
}

/// Failure reported by a persistence gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid table name '{0}'. Use a plain or schema-qualified identifier without quotes.")]
    InvalidTable(String),

    #[error("{0}")]
    Injected(String),
}

/// The per-file transaction could not be committed
#[derive(Error, Debug)]
#[error("Failed to commit '{}': {source}", path.display())]
pub struct CommitError {
    pub path: PathBuf,
    #[source]
    pub source: GatewayError,
}

/// The persistence gateway could not be established; fatal to the run
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to the database: {0}. Check DATABASE_URL and that the server is reachable.")]
    Connect(#[source] sqlx::Error),

    #[error("Table {table} is not usable: {source}. It needs location, floor, name and category columns.")]
    TableUnavailable {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
