//! Record source adapters
//!
//! Turns one input file into a header layout plus a lazy sequence of raw
//! rows. Format is chosen from the file extension:
//!
//! - `.csv`, `.txt`: delimited text, decoded through an [`EncodingChain`]
//! - `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`: workbooks read with calamine
//!
//! Any failure to open or interpret the file is a [`SourceError`] and the
//! caller skips the file. Failures confined to one record surface as a
//! [`RowError`] item in the row stream.

pub mod csv_source;
pub mod encoding;
pub mod layout;
pub mod workbook;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{RowError, SourceError};

pub use encoding::{EncodingChain, DEFAULT_ENCODINGS};
pub use layout::{ColumnLayout, HeaderAliases, LayoutKind};

/// One cell as read from the source, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCell {
    /// Absent or blank
    Missing,
    Text(String),
    /// Present but unreadable (e.g. a spreadsheet `#REF!`); carries a description
    Invalid(String),
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            RawCell::Missing
        } else {
            RawCell::Text(value)
        }
    }
}

static MISSING: RawCell = RawCell::Missing;

/// One data row; `number` is the 1-based line/row in the file as a user sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(number: usize, cells: Vec<RawCell>) -> Self {
        Self { number, cells }
    }

    /// Cell at `index`; short rows read as missing
    pub fn cell(&self, index: usize) -> &RawCell {
        self.cells.get(index).unwrap_or(&MISSING)
    }

    /// True when every cell is missing or whitespace
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| match cell {
            RawCell::Missing => true,
            RawCell::Text(text) => text.trim().is_empty(),
            RawCell::Invalid(_) => false,
        })
    }
}

/// Adapter settings, part of the run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Encoding labels tried in order for text sources
    pub encodings: Vec<String>,
    /// Worksheet to read from workbooks; the first sheet when unset
    pub sheet: Option<String>,
    /// CSV field delimiter
    pub delimiter: char,
    pub headers: HeaderAliases,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.iter().map(|s| s.to_string()).collect(),
            sheet: None,
            delimiter: ',',
            headers: HeaderAliases::default(),
        }
    }
}

/// Which adapter read the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceFormat {
    Csv { encoding: String },
    Workbook { sheet: String },
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv { encoding } => write!(f, "CSV ({})", encoding),
            SourceFormat::Workbook { sheet } => write!(f, "workbook (sheet '{}')", sheet),
        }
    }
}

/// Rows yielded by an adapter
pub type RowStream = Box<dyn Iterator<Item = Result<RawRow, RowError>> + Send>;

/// An opened source: resolved layout plus its remaining rows
pub struct SourceTable {
    path: PathBuf,
    format: SourceFormat,
    headers: Vec<String>,
    layout: ColumnLayout,
    rows: RowStream,
}

impl SourceTable {
    pub(crate) fn new(
        path: &Path,
        format: SourceFormat,
        headers: Vec<String>,
        aliases: &HeaderAliases,
        rows: RowStream,
    ) -> Result<Self, SourceError> {
        if headers.is_empty() {
            return Err(SourceError::EmptySource(path.to_path_buf()));
        }
        let layout = ColumnLayout::resolve(path, &headers, aliases)?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            headers,
            layout,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &SourceFormat {
        &self.format
    }

    /// Header row exactly as found in the file
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }
}

impl Iterator for SourceTable {
    type Item = Result<RawRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Fully blank rows are spreadsheet padding, not records
        loop {
            match self.rows.next()? {
                Ok(row) if row.is_blank() => {
                    tracing::debug!(path = %self.path.display(), row = row.number, "Skipping blank row");
                },
                other => return Some(other),
            }
        }
    }
}

impl fmt::Debug for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTable")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Csv,
    Workbook,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "txt" => Some(SourceKind::Csv),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceKind::Workbook),
        _ => None,
    }
}

/// Open `path` and resolve its header layout.
///
/// Existence is checked first so that a missing file is reported as
/// [`SourceError::NotFound`] regardless of its extension.
pub fn open_source(path: &Path, options: &SourceOptions) -> Result<SourceTable, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    match source_kind(path) {
        Some(SourceKind::Csv) => csv_source::open(path, options),
        Some(SourceKind::Workbook) => workbook::open(path, options),
        None => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    }
}
