//! Build automation tasks for brandsync
//!
//! - Generating the CLI reference from the clap definitions
//! - Writing the built-in configuration defaults to a file

use brandsync_ingest::IngestConfig;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for brandsync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: PathBuf,
    },

    /// Write a configuration file containing every default value
    ///
    /// `brandsync.example.toml` is maintained by hand; this writes the bare
    /// defaults next to it for comparison.
    GenerateConfig {
        /// Output file
        #[arg(short, long, default_value = "brandsync.defaults.toml")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
        Command::GenerateConfig { output } => generate_config(&output)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &Path) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<brandsync_ingest::Cli>();

    let content = format!(
        r#"# brandsync CLI Reference

Generated from the CLI source code on {}.

## Overview

`brandsync` reconciles brand-directory spreadsheets (location, floor, brand
name, category) into a canonical PostgreSQL table. New brands are inserted,
missing categories are filled in, and categories that are already set are
never overwritten, so the same files can be imported again safely.

## Quick Start

```bash
# See how a file will be read
brandsync inspect data/far_eastern.csv

# Try an import without committing anything
DATABASE_URL=postgresql://localhost/brand_location \
  brandsync reconcile data/*.csv data/*.xlsx --dry-run

# Import for real, failing the job if any row was rejected
brandsync reconcile data/*.csv --strict
```

## Exit Status

| Code | Meaning |
|---|---|
| 0 | Run completed (individual files or rows may still have failed) |
| 1 | Configuration or database connection error; nothing was processed |
| 2 | `--strict` was given and at least one file or row failed |

{}

---

*This file is generated. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    fs::create_dir_all(output_dir)?;
    let file_path = output_dir.join("cli.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());
    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    let body = toml::to_string_pretty(&IngestConfig::default())?;
    let content = format!(
        "# brandsync configuration\n\
         # Environment variables (DATABASE_URL, BRANDSYNC_TABLE, ...) and\n\
         # command-line flags override these values.\n\n{}",
        body
    );
    fs::write(output, content)?;

    println!("✅ Wrote example configuration to: {}", output.display());
    Ok(())
}
