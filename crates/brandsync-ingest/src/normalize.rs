//! Row normalization
//!
//! Converts a [`RawRow`] into a [`CanonicalRecord`] using the resolved
//! [`ColumnLayout`]. All four canonical fields are trimmed; the three key
//! fields must be non-empty. A missing or unreadable category or extra
//! becomes the empty string, which the engine treats as "unknown".

use brandsync_common::CanonicalRecord;

use crate::error::RowError;
use crate::source::{ColumnLayout, RawCell, RawRow};

pub fn normalize(layout: &ColumnLayout, row: &RawRow) -> Result<CanonicalRecord, RowError> {
    let location = key_field(row, layout.location, "location")?;
    let floor = key_field(row, layout.floor, "floor")?;
    let name = key_field(row, layout.name, "name")?;

    let category = match row.cell(layout.category) {
        RawCell::Text(text) => text.trim().to_string(),
        RawCell::Missing | RawCell::Invalid(_) => String::new(),
    };

    let extra = layout
        .extras
        .iter()
        .map(|(index, header)| {
            let value = match row.cell(*index) {
                RawCell::Text(text) => text.trim().to_string(),
                RawCell::Missing | RawCell::Invalid(_) => String::new(),
            };
            (header.clone(), value)
        })
        .collect();

    Ok(CanonicalRecord::new(location, floor, name, category)
        .with_extra(extra)
        .with_row_number(row.number))
}

fn key_field(row: &RawRow, index: usize, field: &'static str) -> Result<String, RowError> {
    match row.cell(index) {
        RawCell::Text(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        RawCell::Text(_) | RawCell::Missing => Err(RowError::MissingField {
            row: row.number,
            field,
        }),
        RawCell::Invalid(detail) => Err(RowError::UnreadableField {
            row: row.number,
            field,
            detail: detail.clone(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::source::HeaderAliases;
    use std::path::Path;

    fn layout(headers: &[&str]) -> ColumnLayout {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        ColumnLayout::resolve(Path::new("t.csv"), &headers, &HeaderAliases::default()).unwrap()
    }

    fn row(number: usize, cells: &[&str]) -> RawRow {
        RawRow::new(number, cells.iter().map(|c| RawCell::text(*c)).collect())
    }

    #[test]
    fn test_fields_are_trimmed() {
        let layout = layout(&["location", "floor", "name", "category"]);
        let record = normalize(&layout, &row(2, &[" A ", "1F ", " Nike", " Sportswear "])).unwrap();
        assert_eq!(record, CanonicalRecord::new("A", "1F", "Nike", "Sportswear").with_row_number(2));
    }

    #[test]
    fn test_missing_category_becomes_empty() {
        let layout = layout(&["location", "floor", "name", "category"]);
        let record = normalize(&layout, &row(3, &["A", "1F", "Nike"])).unwrap();
        assert_eq!(record.category, "");

        let record = normalize(&layout, &row(4, &["A", "1F", "Nike", "   "])).unwrap();
        assert_eq!(record.category, "");
    }

    #[test]
    fn test_blank_key_field_is_rejected() {
        let layout = layout(&["location", "floor", "name", "category"]);
        let err = normalize(&layout, &row(5, &["A", "  ", "Nike", "x"])).unwrap_err();
        assert!(matches!(
            err,
            RowError::MissingField {
                row: 5,
                field: "floor"
            }
        ));
    }

    #[test]
    fn test_invalid_key_cell_is_unreadable() {
        let layout = layout(&["location", "floor", "name", "category"]);
        let raw = RawRow::new(
            6,
            vec![
                RawCell::text("A"),
                RawCell::text("1F"),
                RawCell::Invalid("cell error #REF!".to_string()),
                RawCell::text("x"),
            ],
        );
        let err = normalize(&layout, &raw).unwrap_err();
        assert!(matches!(err, RowError::UnreadableField { field: "name", .. }));
    }

    #[test]
    fn test_invalid_category_is_unknown() {
        let layout = layout(&["location", "floor", "name", "category"]);
        let raw = RawRow::new(
            7,
            vec![
                RawCell::text("A"),
                RawCell::text("1F"),
                RawCell::text("Nike"),
                RawCell::Invalid("cell error #N/A".to_string()),
            ],
        );
        assert_eq!(normalize(&layout, &raw).unwrap().category, "");
    }

    #[test]
    fn test_extras_follow_layout() {
        let layout = layout(&["樓層", "館別", "品牌", "分類", "網址"]);
        let record = normalize(&layout, &row(2, &["1F", "A", "Nike", "", "https://nike.com"])).unwrap();
        // Positional layout takes columns in order regardless of header text
        assert_eq!(record.location, "1F");
        assert_eq!(record.extra, vec![("網址".to_string(), "https://nike.com".to_string())]);

        let record = normalize(&layout, &row(3, &["1F", "A", "Zara"])).unwrap();
        assert_eq!(record.extra, vec![("網址".to_string(), String::new())]);
    }
}
