//! `brandsync inspect`
//!
//! Opens a source exactly as an import would and shows the detected format,
//! header layout, record counts and the first few normalized records.

use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::config::IngestConfig;
use crate::normalize::normalize;
use crate::source::{open_source, ColumnLayout, SourceFormat};
use crate::Cli;
use brandsync_common::CanonicalRecord;

#[derive(Debug, Serialize)]
pub struct Inspection {
    pub format: SourceFormat,
    pub headers: Vec<String>,
    pub layout: ColumnLayout,
    /// Records that normalized cleanly
    pub valid: usize,
    /// Records that would be counted as errored
    pub invalid: usize,
    pub preview: Vec<PreviewRow>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PreviewRow {
    Ok { record: CanonicalRecord },
    Error { row: usize, message: String },
}

pub fn run(cli: &Cli, file: &Path, rows: usize, sheet: Option<&str>) -> anyhow::Result<()> {
    let mut config = IngestConfig::load(cli.config.as_deref())?;
    if let Some(sheet) = sheet {
        config.source.sheet = Some(sheet.to_string());
    }

    let inspection = inspect(file, &config, rows)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        print_inspection(file, &inspection);
    }
    Ok(())
}

pub fn inspect(file: &Path, config: &IngestConfig, rows: usize) -> anyhow::Result<Inspection> {
    let table = open_source(file, &config.source)?;
    let format = table.format().clone();
    let headers = table.headers().to_vec();
    let layout = table.layout().clone();

    let mut valid = 0;
    let mut invalid = 0;
    let mut preview = Vec::new();
    for row in table {
        let entry = match row.and_then(|raw| normalize(&layout, &raw)) {
            Ok(record) => {
                valid += 1;
                PreviewRow::Ok { record }
            },
            Err(e) => {
                invalid += 1;
                PreviewRow::Error {
                    row: e.row(),
                    message: e.to_string(),
                }
            },
        };
        if preview.len() < rows {
            preview.push(entry);
        }
    }

    Ok(Inspection {
        format,
        headers,
        layout,
        valid,
        invalid,
        preview,
    })
}

fn print_inspection(file: &Path, inspection: &Inspection) {
    println!("{}", file.display().to_string().cyan().bold());
    println!("  Format:  {}", inspection.format);
    println!("  Headers: {}", inspection.headers.join(" | "));
    println!("  Layout:  {}", inspection.layout.describe());
    println!(
        "  Records: {} valid, {} invalid",
        inspection.valid,
        inspection.invalid.to_string().red()
    );
    println!();

    if inspection.preview.is_empty() {
        println!("No data rows found.");
        return;
    }

    for row in &inspection.preview {
        match row {
            PreviewRow::Ok { record } => {
                let category = if record.category.is_empty() {
                    "(none)".dimmed().to_string()
                } else {
                    record.category.clone()
                };
                println!(
                    "  {:>4}  {}  {}",
                    record.row_number,
                    record.key().to_string().green(),
                    category
                );
            },
            PreviewRow::Error { message, .. } => println!("  {}", message.red()),
        }
    }
}
