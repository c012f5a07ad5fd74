//! Brandsync Ingest Library
//!
//! Reconciles brand-directory spreadsheets (mall location, floor, brand
//! name, category) into a canonical PostgreSQL table.
//!
//! # Pipeline
//!
//! - **Source adapters** ([`source`]): CSV with encoding fallback, Excel and
//!   ODS workbooks; header layout resolved by name or position
//! - **Normalizer** ([`normalize`]): trimmed, validated [`CanonicalRecord`]s
//! - **Engine** ([`engine`]): insert new keys, fill in empty categories,
//!   leave populated categories alone
//! - **Coordinator** ([`coordinator`]): one transaction per file, per-file
//!   and per-row failure isolation, [`RunReport`] at the end
//! - **Gateways** ([`gateway`]): PostgreSQL via sqlx, in-memory for tests
//!
//! # Example
//!
//! ```no_run
//! use brandsync_ingest::{BatchCoordinator, DatabaseConfig, PgGateway, RunOptions};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = PgGateway::connect(&DatabaseConfig::default(), "brand_presence").await?;
//!     let mut coordinator = BatchCoordinator::new(gateway, RunOptions::default());
//!     let report = coordinator.run(&[PathBuf::from("data/far_eastern.csv")]).await;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! [`CanonicalRecord`]: brandsync_common::CanonicalRecord

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod report;
pub mod source;

// Re-export commonly used types
pub use config::{DatabaseConfig, IngestConfig};
pub use coordinator::{BatchCoordinator, RunOptions};
pub use engine::{ImportMode, ReconciliationEngine};
pub use error::{CommitError, ConnectionError, GatewayError, RowError, SourceError};
pub use gateway::{Lookup, MemoryGateway, PersistenceGateway, PgGateway};
pub use report::{FileOutcome, FileReport, RunReport};
pub use source::{open_source, SourceOptions};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Brandsync - reconcile brand-directory spreadsheets into a canonical table
#[derive(Parser, Debug)]
#[command(name = "brandsync")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./brandsync.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert new brands and fill in missing categories
    Reconcile(ImportArgs),

    /// Insert every row without checking for existing brands
    Append(ImportArgs),

    /// Show how a source file would be read, without touching the database
    Inspect {
        /// Source file to inspect
        file: PathBuf,

        /// Number of records to preview
        #[arg(short = 'n', long, default_value_t = 5)]
        rows: usize,

        /// Worksheet to read from a workbook
        #[arg(long)]
        sheet: Option<String>,
    },
}

/// Options shared by the import commands
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Source files (.csv, .txt, .xlsx, .xlsm, .xlsb, .xls, .ods); defaults to
    /// `source_files` from the configuration
    pub files: Vec<PathBuf>,

    /// Target table, optionally schema-qualified
    #[arg(short, long, env = "BRANDSYNC_TABLE")]
    pub table: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Process everything but roll each file back instead of committing
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 when any file or row failed
    #[arg(long)]
    pub strict: bool,

    /// Worksheet to read from workbooks
    #[arg(long)]
    pub sheet: Option<String>,
}

impl ImportArgs {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut IngestConfig) {
        if let Some(ref table) = self.table {
            config.table_name = table.clone();
        }
        if let Some(ref url) = self.database_url {
            config.database.url = url.clone();
        }
        if let Some(ref sheet) = self.sheet {
            config.source.sheet = Some(sheet.clone());
        }
        if !self.files.is_empty() {
            config.source_files = self.files.clone();
        }
    }
}
