//! Command implementations for the `brandsync` binary

pub mod import;
pub mod inspect;

use std::process::ExitCode;

use crate::engine::ImportMode;
use crate::{Cli, Commands};

/// Exit status when `--strict` is set and the run was not clean
pub const EXIT_UNCLEAN: u8 = 2;

/// Run the parsed command.
///
/// Errors returned here are fatal to the run (configuration, connection);
/// per-file and per-row failures are part of the report instead.
pub async fn execute(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Reconcile(args) => import::run(cli, args, ImportMode::Reconcile).await,
        Commands::Append(args) => import::run(cli, args, ImportMode::Append).await,
        Commands::Inspect { file, rows, sheet } => {
            inspect::run(cli, file, *rows, sheet.as_deref())?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
