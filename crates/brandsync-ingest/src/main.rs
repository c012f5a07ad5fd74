//! Brandsync - brand-directory reconciliation tool

use brandsync_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use brandsync_ingest::{commands, Cli};
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("brandsync")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // Hold the guard so file logs are flushed on exit
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    match commands::execute(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}
