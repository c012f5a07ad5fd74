//! Run and per-file outcomes

use brandsync_common::FileCounts;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::engine::ImportMode;
use crate::source::{LayoutKind, SourceFormat};

/// How processing of one file ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Every readable record was applied and the batch committed
    Completed { counts: FileCounts },
    /// The file could not be opened or interpreted; nothing was written
    SourceFailed { error: String },
    /// Records were processed but the batch was not committed
    CommitFailed { counts: FileCounts, error: String },
    /// Records were processed and deliberately rolled back
    DryRun { counts: FileCounts },
}

impl FileOutcome {
    /// Counters as classified, whether or not they were persisted
    pub fn counts(&self) -> FileCounts {
        match self {
            FileOutcome::Completed { counts }
            | FileOutcome::CommitFailed { counts, .. }
            | FileOutcome::DryRun { counts } => *counts,
            FileOutcome::SourceFailed { .. } => FileCounts::default(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::SourceFailed { .. } | FileOutcome::CommitFailed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutKind>,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    /// Messages of the rows counted as errored, in file order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub row_errors: Vec<String>,
}

impl FileReport {
    pub fn source_failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            format: None,
            layout: None,
            outcome: FileOutcome::SourceFailed {
                error: error.to_string(),
            },
            row_errors: Vec::new(),
        }
    }
}

/// Summary of one invocation over a list of files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub mode: ImportMode,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn new(mode: ImportMode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            files: Vec::new(),
        }
    }

    /// Counters of files whose batch was committed
    pub fn committed_totals(&self) -> FileCounts {
        let mut totals = FileCounts::default();
        for file in &self.files {
            if let FileOutcome::Completed { counts } = &file.outcome {
                totals += *counts;
            }
        }
        totals
    }

    /// Counters across all files, persisted or not
    pub fn totals(&self) -> FileCounts {
        let mut totals = FileCounts::default();
        for file in &self.files {
            totals += file.outcome.counts();
        }
        totals
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_failure()).count()
    }

    /// No file failed and no row errored
    pub fn is_clean(&self) -> bool {
        self.failed_files() == 0 && self.totals().errored == 0
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.outcome {
            FileOutcome::Completed { counts } => write!(f, "{}: {}", path, counts),
            FileOutcome::DryRun { counts } => write!(f, "{}: {} (dry run, rolled back)", path, counts),
            FileOutcome::SourceFailed { error } => write!(f, "{}: skipped ({})", path, error),
            FileOutcome::CommitFailed { counts, error } => {
                write!(f, "{}: {} NOT committed ({})", path, counts, error)
            },
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{}", file)?;
        }
        write!(
            f,
            "{} file(s), {} failed; {}",
            self.files.len(),
            self.failed_files(),
            self.totals()
        )
    }
}
