//! `brandsync reconcile` and `brandsync append`

use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use super::EXIT_UNCLEAN;
use crate::config::{IngestConfig, DEFAULT_CONFIG_FILE};
use crate::coordinator::{BatchCoordinator, RunOptions};
use crate::engine::ImportMode;
use crate::gateway::PgGateway;
use crate::report::{FileOutcome, RunReport};
use crate::{Cli, ImportArgs};

/// Row errors listed per file before the rest are summarised
const MAX_LISTED_ROW_ERRORS: usize = 10;

pub async fn run(cli: &Cli, args: &ImportArgs, mode: ImportMode) -> anyhow::Result<ExitCode> {
    let config = resolve_config(cli, args, mode)?;
    let files = source_files(&config)?;

    let gateway = PgGateway::connect(&config.database, &config.table_name)
        .await
        .with_context(|| format!("Cannot reach table '{}'", config.table_name))?;
    info!(table = %gateway.table(), "Database ready");

    let options = RunOptions {
        mode,
        dry_run: args.dry_run,
        source: config.source.clone(),
    };
    let mut coordinator = BatchCoordinator::new(gateway, options);
    let report = coordinator.run(&files).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if args.strict && !report.is_clean() {
        return Ok(ExitCode::from(EXIT_UNCLEAN));
    }
    Ok(ExitCode::SUCCESS)
}

/// Config file and environment, then command-line flags, then validation
fn resolve_config(cli: &Cli, args: &ImportArgs, mode: ImportMode) -> anyhow::Result<IngestConfig> {
    let mut config = IngestConfig::load(cli.config.as_deref())?;
    config.mode = mode;
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

fn source_files(config: &IngestConfig) -> anyhow::Result<Vec<PathBuf>> {
    if config.source_files.is_empty() {
        anyhow::bail!(
            "No source files given. Pass them as arguments or set source_files in {}",
            DEFAULT_CONFIG_FILE
        );
    }
    Ok(config.source_files.clone())
}

fn print_report(report: &RunReport) {
    let title = match report.mode {
        ImportMode::Reconcile => "Reconciliation summary",
        ImportMode::Append => "Append summary",
    };
    println!("{}", title.cyan().bold());
    println!();

    for file in &report.files {
        let marker = match file.outcome {
            FileOutcome::Completed { .. } if file.row_errors.is_empty() => "✓".green(),
            FileOutcome::Completed { .. } | FileOutcome::DryRun { .. } => "!".yellow(),
            FileOutcome::SourceFailed { .. } | FileOutcome::CommitFailed { .. } => "✗".red(),
        };
        println!("{} {}", marker, file);
        if let (Some(format), Some(layout)) = (&file.format, file.layout) {
            println!("    {}", format!("{}, {:?} headers", format, layout).dimmed());
        }

        for error in file.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
            println!("    {}", error);
        }
        if file.row_errors.len() > MAX_LISTED_ROW_ERRORS {
            println!(
                "    ... and {} more",
                file.row_errors.len() - MAX_LISTED_ROW_ERRORS
            );
        }
    }

    let totals = report.totals();
    println!();
    println!("{}", "Totals:".cyan().bold());
    println!("  Files:    {} ({} failed)", report.files.len(), report.failed_files());
    println!("  Inserted: {}", totals.inserted);
    println!("  Updated:  {}", totals.updated);
    println!("  Skipped:  {}", totals.skipped);
    println!("  Errored:  {}", totals.errored);
    println!("  Records:  {} ({} written)", totals.total(), totals.written());

    if report.dry_run {
        println!();
        println!("{}", "Dry run: nothing was committed.".yellow());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_missing_source_files_is_an_error() {
        let err = source_files(&IngestConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No source files"));
    }

    #[test]
    fn test_cli_flags_win_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brandsync.toml");
        std::fs::write(&path, "table_name = \"from_file\"\nsource_files = [\"a.csv\"]\n").unwrap();

        let cli = Cli::try_parse_from([
            "brandsync",
            "--config",
            path.to_str().unwrap(),
            "append",
            "--table",
            "from_cli",
        ])
        .unwrap();
        let crate::Commands::Append(args) = &cli.command else {
            panic!("expected append");
        };

        let config = resolve_config(&cli, args, ImportMode::Append).unwrap();
        assert_eq!(config.table_name, "from_cli");
        assert_eq!(config.mode, ImportMode::Append);
        assert_eq!(config.source_files, vec![PathBuf::from("a.csv")]);
    }
}
