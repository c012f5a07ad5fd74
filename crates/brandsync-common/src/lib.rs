//! Brandsync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error handling and logging for the brandsync workspace.
//!
//! # Overview
//!
//! - **Types**: the record model shared by the ingest pipeline
//!   ([`RecordKey`], [`CanonicalRecord`], [`Classification`], [`FileCounts`])
//! - **Error Handling**: [`BrandsyncError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by configuration or environment
//!
//! # Example
//!
//! ```
//! use brandsync_common::{CanonicalRecord, Classification, FileCounts};
//!
//! let record = CanonicalRecord::new("A", "1F", "Nike", "Sportswear");
//! assert_eq!(record.key().name, "Nike");
//!
//! let mut counts = FileCounts::default();
//! counts.record(Classification::Insert);
//! assert_eq!(counts.inserted, 1);
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BrandsyncError, Result};
pub use types::{CanonicalRecord, Classification, FileCounts, RecordKey};
