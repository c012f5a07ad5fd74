//! Batch coordination
//!
//! Runs every source file as an independent unit of work: open, normalize
//! and reconcile each record, then commit (or roll back on a dry run).
//! A file that cannot be opened is skipped, a record that fails is counted,
//! and a failed commit loses only that file's batch. The run itself never
//! stops early once the gateway is connected.

use brandsync_common::{CanonicalRecord, Classification, FileCounts};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::engine::{ImportMode, ReconciliationEngine};
use crate::error::{CommitError, RowError};
use crate::gateway::PersistenceGateway;
use crate::normalize::normalize;
use crate::report::{FileOutcome, FileReport, RunReport};
use crate::source::{open_source, SourceOptions};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: ImportMode,
    /// Roll every file back instead of committing
    pub dry_run: bool,
    pub source: SourceOptions,
}

pub struct BatchCoordinator<G> {
    gateway: G,
    engine: ReconciliationEngine,
    options: RunOptions,
}

impl<G: PersistenceGateway> BatchCoordinator<G> {
    pub fn new(gateway: G, options: RunOptions) -> Self {
        Self {
            gateway,
            engine: ReconciliationEngine::new(options.mode),
            options,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Process `files` in the given order
    pub async fn run(&mut self, files: &[PathBuf]) -> RunReport {
        info!(
            files = files.len(),
            mode = %self.options.mode,
            dry_run = self.options.dry_run,
            "Starting run"
        );

        let mut report = RunReport::new(self.options.mode, self.options.dry_run);
        for path in files {
            let file = self.process_file(path).await;
            report.files.push(file);
        }

        let totals = report.totals();
        info!(
            inserted = totals.inserted,
            updated = totals.updated,
            skipped = totals.skipped,
            errored = totals.errored,
            failed_files = report.failed_files(),
            "Run finished"
        );
        report
    }

    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub async fn process_file(&mut self, path: &Path) -> FileReport {
        let table = match open_source(path, &self.options.source) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Skipping source file");
                return FileReport::source_failed(path.to_path_buf(), e);
            },
        };

        let format = table.format().clone();
        let layout = table.layout().clone();
        info!(format = %format, layout = %layout.describe(), "Processing source file");

        let mut counts = FileCounts::default();
        let mut row_errors = Vec::new();
        for row in table {
            let result = match row.and_then(|raw| normalize(&layout, &raw)) {
                Ok(record) => self.apply(&record).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(classification) => counts.record(classification),
                Err(e) => {
                    warn!(row = e.row(), error = %e, "Record failed");
                    counts.record_error();
                    row_errors.push(e.to_string());
                },
            }
        }

        let outcome = self.finish(path, counts).await;
        FileReport {
            path: path.to_path_buf(),
            format: Some(format),
            layout: Some(layout.kind),
            outcome,
            row_errors,
        }
    }

    async fn apply(&mut self, record: &CanonicalRecord) -> Result<Classification, RowError> {
        let classification = self
            .engine
            .process(&mut self.gateway, record)
            .await
            .map_err(|source| RowError::Gateway {
                row: record.row_number,
                key: record.key(),
                source,
            })?;

        match classification {
            Classification::Insert => {
                debug!(row = record.row_number, key = %record.key(), category = %record.category, "Inserted");
            },
            Classification::Patch => {
                info!(row = record.row_number, key = %record.key(), category = %record.category, "Filled in category");
            },
            Classification::Skip => {
                debug!(row = record.row_number, key = %record.key(), "Category already set");
            },
        }
        Ok(classification)
    }

    /// End the file's unit of work
    async fn finish(&mut self, path: &Path, counts: FileCounts) -> FileOutcome {
        if self.options.dry_run {
            if let Err(e) = self.gateway.rollback().await {
                warn!(error = %e, "Rollback failed");
            }
            info!(%counts, "Dry run, changes rolled back");
            return FileOutcome::DryRun { counts };
        }

        match self.gateway.commit().await {
            Ok(()) => {
                info!(%counts, records = counts.total(), written = counts.written(), "Committed");
                FileOutcome::Completed { counts }
            },
            Err(source) => {
                let err = CommitError {
                    path: path.to_path_buf(),
                    source,
                };
                error!(error = %err, "Batch lost");
                FileOutcome::CommitFailed {
                    counts,
                    error: err.to_string(),
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use brandsync_common::RecordKey;
    use std::io::Write;

    fn csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_row_failure_does_not_stop_the_file() {
        let file = csv("location,floor,name,category\nA,1F,Nike,x\nA,,Zara,y\nA,2F,Uniqlo,z\n");
        let mut coordinator = BatchCoordinator::new(MemoryGateway::new(), RunOptions::default());

        let report = coordinator.process_file(file.path()).await;
        assert_eq!(
            report.outcome,
            FileOutcome::Completed {
                counts: FileCounts {
                    inserted: 2,
                    updated: 0,
                    skipped: 0,
                    errored: 1
                }
            }
        );
        assert_eq!(report.row_errors, vec!["Row 3: required field 'floor' is empty"]);
        assert_eq!(coordinator.gateway().len(), 2);
    }

    #[tokio::test]
    async fn test_gateway_error_becomes_row_error() {
        let file = csv("location,floor,name,category\nA,1F,Nike,x\n");
        let mut gateway = MemoryGateway::new();
        gateway.fail_lookup_for(RecordKey::new("A", "1F", "Nike"));
        let mut coordinator = BatchCoordinator::new(gateway, RunOptions::default());

        let report = coordinator.process_file(file.path()).await;
        assert_eq!(report.outcome.counts().errored, 1);
        assert!(report.row_errors[0].starts_with("Row 2 (A / 1F / Nike)"));
    }

    #[tokio::test]
    async fn test_dry_run_rolls_back() {
        let file = csv("location,floor,name,category\nA,1F,Nike,x\n");
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let mut coordinator = BatchCoordinator::new(MemoryGateway::new(), options);

        let report = coordinator.run(&[file.path().to_path_buf()]).await;
        assert!(matches!(report.files[0].outcome, FileOutcome::DryRun { .. }));
        assert_eq!(report.totals().inserted, 1);

        let gateway = coordinator.into_gateway();
        assert!(gateway.is_empty());
        assert_eq!(gateway.commit_count(), 0);
        assert_eq!(gateway.rollback_count(), 1);
    }
}
