//! Spreadsheet adapter backed by calamine

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use super::{RawCell, RawRow, SourceFormat, SourceOptions, SourceTable};
use crate::error::SourceError;

// Largest float that still renders exactly as an integer
const MAX_INTEGRAL_FLOAT: f64 = 9_007_199_254_740_992.0;

pub(crate) fn open(path: &Path, options: &SourceOptions) -> Result<SourceTable, SourceError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SourceError::workbook(path, e))?;

    let sheet_names = workbook.sheet_names();
    let sheet = match &options.sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| *name == wanted)
            .cloned()
            .ok_or_else(|| {
                SourceError::workbook(
                    path,
                    format!(
                        "sheet '{}' not found (available: {})",
                        wanted,
                        sheet_names.join(", ")
                    ),
                )
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| SourceError::EmptySource(path.to_path_buf()))?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| SourceError::workbook(path, e))?;
    tracing::debug!(
        path = %path.display(),
        sheet = %sheet,
        height = range.height(),
        width = range.width(),
        "Opened worksheet"
    );

    let (headers, rows) = split_header(&range);
    SourceTable::new(
        path,
        SourceFormat::Workbook { sheet },
        headers,
        &options.headers,
        Box::new(rows.into_iter().map(Ok)),
    )
}

/// First used row becomes the header; row numbers match the sheet's own numbering
fn split_header(range: &Range<Data>) -> (Vec<String>, Vec<RawRow>) {
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();

    let headers = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|cell| match convert_cell(cell) {
                RawCell::Text(text) | RawCell::Invalid(text) => text,
                RawCell::Missing => String::new(),
            })
            .collect(),
        None => Vec::new(),
    };

    let data = rows
        .enumerate()
        .map(|(offset, cells)| {
            RawRow::new(
                first_row + offset + 2,
                cells.iter().map(convert_cell).collect(),
            )
        })
        .collect();

    (headers, data)
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Missing,
        Data::String(text) => RawCell::text(text.as_str()),
        Data::Int(value) => RawCell::Text(value.to_string()),
        Data::Float(value) => RawCell::Text(format_float(*value)),
        Data::Bool(value) => RawCell::Text(value.to_string()),
        Data::Error(error) => RawCell::Invalid(format!("cell error {}", error)),
        other => RawCell::text(other.to_string()),
    }
}

/// Floor numbers stored as `3.0` should read back as `3`
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_INTEGRAL_FLOAT {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
