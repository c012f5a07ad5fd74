//! Record model shared by the ingest pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Natural key of the canonical table.
///
/// Two records refer to the same row when all three parts are equal
/// byte-for-byte. Normalisation (trimming) happens before a key is built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub location: String,
    pub floor: String,
    pub name: String,
}

impl RecordKey {
    pub fn new(
        location: impl Into<String>,
        floor: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            floor: floor.into(),
            name: name.into(),
        }
    }
}

impl From<(&str, &str, &str)> for RecordKey {
    fn from((location, floor, name): (&str, &str, &str)) -> Self {
        RecordKey::new(location, floor, name)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.location, self.floor, self.name)
    }
}

/// One normalised input row.
///
/// Built transiently per source row and never persisted as an object; only
/// its effect (an insert or a category patch) reaches the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub location: String,
    pub floor: String,
    pub name: String,
    /// Empty means "unknown"; missing and blank cells both end up here as `""`.
    pub category: String,
    /// Passthrough columns beyond the canonical four, in source order
    #[serde(default)]
    pub extra: Vec<(String, String)>,
    /// 1-based line/row in the source file, header being 1 (0 when built by hand)
    #[serde(default)]
    pub row_number: usize,
}

impl CanonicalRecord {
    pub fn new(
        location: impl Into<String>,
        floor: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            floor: floor.into(),
            name: name.into(),
            category: category.into(),
            extra: Vec::new(),
            row_number: 0,
        }
    }

    pub fn with_row_number(mut self, row_number: usize) -> Self {
        self.row_number = row_number;
        self
    }

    pub fn with_extra(mut self, extra: Vec<(String, String)>) -> Self {
        self.extra = extra;
        self
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.location, &self.floor, &self.name)
    }
}

/// Outcome of reconciling one record against the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No row with the key existed; a new row was written
    Insert,
    /// A row existed with an empty category; the category was filled in
    Patch,
    /// A row existed with a populated category; nothing was written
    Skip,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Insert => "insert",
            Classification::Patch => "patch",
            Classification::Skip => "skip",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errored: u64,
}

impl FileCounts {
    /// Count one successfully classified record
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Insert => self.inserted += 1,
            Classification::Patch => self.updated += 1,
            Classification::Skip => self.skipped += 1,
        }
    }

    /// Count one record that could not be read or applied
    pub fn record_error(&mut self) {
        self.errored += 1;
    }

    /// Records that reached a classification
    pub fn processed(&self) -> u64 {
        self.inserted + self.updated + self.skipped
    }

    pub fn total(&self) -> u64 {
        self.processed() + self.errored
    }

    /// Number of records that caused a write
    pub fn written(&self) -> u64 {
        self.inserted + self.updated
    }
}

impl AddAssign for FileCounts {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errored += other.errored;
    }
}

impl fmt::Display for FileCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted {} / updated {} / skipped {} / errored {}",
            self.inserted, self.updated, self.skipped, self.errored
        )
    }
}
