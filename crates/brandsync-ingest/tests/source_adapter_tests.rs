//! Source adapter behaviour on real files

#![allow(clippy::unwrap_used, clippy::expect_used)]

use brandsync_ingest::normalize::normalize;
use brandsync_ingest::source::{open_source, LayoutKind, RawRow, SourceFormat, SourceOptions};
use brandsync_ingest::SourceError;
use rust_xlsxwriter::Workbook;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_bytes(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn rows(path: &PathBuf, options: &SourceOptions) -> Vec<RawRow> {
    open_source(path, options).unwrap().map(Result::unwrap).collect()
}

#[test]
fn test_utf8_with_bom() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(
        &dir,
        "bom.csv",
        "\u{feff}location,floor,name,category\n信義A8,B1,無印良品,生活\n".as_bytes(),
    );

    let table = open_source(&path, &SourceOptions::default()).unwrap();
    assert_eq!(table.layout().kind, LayoutKind::Named);
    assert_eq!(
        table.format(),
        &SourceFormat::Csv {
            encoding: "UTF-8".to_string()
        }
    );

    let layout = table.layout().clone();
    let records: Vec<_> = table.map(|row| normalize(&layout, &row.unwrap()).unwrap()).collect();
    assert_eq!(records[0].location, "信義A8");
    assert_eq!(records[0].name, "無印良品");
}

#[test]
fn test_big5_fallback() {
    let dir = TempDir::new().unwrap();
    // "location,floor,name,category\n遠百,1F,Nike,運動\n" in Big5
    let mut bytes = b"location,floor,name,category\n".to_vec();
    bytes.extend_from_slice(&[0xBB, 0xB7, 0xA6, 0xCA]);
    bytes.extend_from_slice(b",1F,Nike,");
    bytes.extend_from_slice(&[0xB9, 0x42, 0xB0, 0xCA]);
    bytes.push(b'\n');
    let path = write_bytes(&dir, "big5.csv", &bytes);

    let table = open_source(&path, &SourceOptions::default()).unwrap();
    assert_eq!(
        table.format(),
        &SourceFormat::Csv {
            encoding: "Big5".to_string()
        }
    );

    let layout = table.layout().clone();
    let records: Vec<_> = table.map(|row| normalize(&layout, &row.unwrap()).unwrap()).collect();
    assert_eq!(records[0].location, "遠百");
    assert_eq!(records[0].category, "運動");
}

#[test]
fn test_undecodable_source_lists_tried_encodings() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, "latin1.csv", b"location,floor,name,category\nA,1F,Caf\xe9,\n");
    let options = SourceOptions {
        encodings: vec!["utf-8".to_string()],
        ..SourceOptions::default()
    };

    match open_source(&path, &options).unwrap_err() {
        SourceError::Undecodable { tried, .. } => assert_eq!(tried, vec!["UTF-8"]),
        other => panic!("expected undecodable, got {:?}", other),
    }
}

#[test]
fn test_configured_encoding_order_is_respected() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, "latin1.csv", b"location,floor,name,category\nA,1F,Caf\xe9,\n");
    let options = SourceOptions {
        encodings: vec!["utf-8".to_string(), "windows-1252".to_string()],
        ..SourceOptions::default()
    };

    let rows = rows(&path, &options);
    assert_eq!(rows[0].cells[2], brandsync_ingest::source::RawCell::Text("Café".to_string()));
}

#[test]
fn test_too_few_columns_is_source_error() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, "narrow.csv", b"location,floor,name\nA,1F,Nike\n");

    let err = open_source(&path, &SourceOptions::default()).unwrap_err();
    assert!(matches!(err, SourceError::TooFewColumns { found: 3, .. }));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, "brands.pdf", b"%PDF-1.4");

    let err = open_source(&path, &SourceOptions::default()).unwrap_err();
    assert!(matches!(err, SourceError::UnsupportedFormat(_)));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = open_source(&dir.path().join("gone.xlsx"), &SourceOptions::default()).unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}

#[test]
fn test_header_only_file_has_no_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, "empty.csv", b"location,floor,name,category\n");
    assert!(rows(&path, &SourceOptions::default()).is_empty());
}

#[test]
fn test_txt_extension_is_read_as_csv() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(&dir, "export.TXT", b"location,floor,name,category\nA,1F,Nike,x\n");
    assert_eq!(rows(&path, &SourceOptions::default()).len(), 1);
}

#[test]
fn test_positional_layout_keeps_fifth_column_as_extra() {
    let dir = TempDir::new().unwrap();
    let path = write_bytes(
        &dir,
        "directory.csv",
        "館別,樓層,品牌,分類,電話\n遠百信義,1F,Nike,運動,02-1234\n".as_bytes(),
    );

    let table = open_source(&path, &SourceOptions::default()).unwrap();
    assert_eq!(table.layout().kind, LayoutKind::Positional);

    let layout = table.layout().clone();
    let record = table
        .map(|row| normalize(&layout, &row.unwrap()).unwrap())
        .next()
        .unwrap();
    assert_eq!(
        (record.location.as_str(), record.floor.as_str(), record.name.as_str(), record.category.as_str()),
        ("遠百信義", "1F", "Nike", "運動")
    );
    assert_eq!(record.extra, vec![("電話".to_string(), "02-1234".to_string())]);
}

fn save_workbook(workbook: &mut Workbook, dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    workbook.save(&path).unwrap();
    path
}

/// Two sheets: a notes page first, then the brand directory
fn two_sheet_workbook(dir: &TempDir) -> PathBuf {
    let mut workbook = Workbook::new();

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "exported from the leasing system").unwrap();

    let directory = workbook.add_worksheet();
    directory.set_name("Directory").unwrap();
    for (col, header) in ["location", "floor", "name", "category"].iter().enumerate() {
        directory.write_string(0, col as u16, *header).unwrap();
    }
    directory.write_string(1, 0, "微風廣場").unwrap();
    directory.write_string(1, 1, "B1").unwrap();
    directory.write_string(1, 2, "Muji").unwrap();
    directory.write_string(1, 3, "Lifestyle").unwrap();

    save_workbook(&mut workbook, dir, "breeze.xlsx")
}

#[test]
fn test_positional_workbook_with_numeric_floor() {
    let dir = TempDir::new().unwrap();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["館別", "樓層", "品牌", "分類", "網址"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "A").unwrap();
    sheet.write_number(1, 1, 3.0).unwrap();
    sheet.write_string(1, 2, "Nike").unwrap();
    sheet.write_string(1, 3, "Sportswear").unwrap();
    sheet.write_string(1, 4, "https://nike.com").unwrap();
    let path = save_workbook(&mut workbook, &dir, "directory.xlsx");

    let table = open_source(&path, &SourceOptions::default()).unwrap();
    assert_eq!(table.layout().kind, LayoutKind::Positional);
    assert_eq!(
        table.format(),
        &SourceFormat::Workbook {
            sheet: "Sheet1".to_string()
        }
    );

    let layout = table.layout().clone();
    let records: Vec<_> = table.map(|row| normalize(&layout, &row.unwrap()).unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(
        (records[0].location.as_str(), records[0].floor.as_str(), records[0].name.as_str()),
        ("A", "3", "Nike")
    );
    assert_eq!(records[0].row_number, 2);
    assert_eq!(records[0].extra, vec![("網址".to_string(), "https://nike.com".to_string())]);
}

#[test]
fn test_named_sheet_is_selected() {
    let dir = TempDir::new().unwrap();
    let path = two_sheet_workbook(&dir);
    let options = SourceOptions {
        sheet: Some("Directory".to_string()),
        ..SourceOptions::default()
    };

    let table = open_source(&path, &options).unwrap();
    assert_eq!(
        table.format(),
        &SourceFormat::Workbook {
            sheet: "Directory".to_string()
        }
    );
    assert_eq!(table.layout().kind, LayoutKind::Named);

    let layout = table.layout().clone();
    let records: Vec<_> = table.map(|row| normalize(&layout, &row.unwrap()).unwrap()).collect();
    assert_eq!(records[0].name, "Muji");
    assert_eq!(records[0].category, "Lifestyle");
}

#[test]
fn test_first_sheet_is_read_by_default() {
    let dir = TempDir::new().unwrap();
    let path = two_sheet_workbook(&dir);

    // The notes sheet has a single column, so it cannot hold a directory
    let err = open_source(&path, &SourceOptions::default()).unwrap_err();
    assert!(matches!(err, SourceError::TooFewColumns { found: 1, .. }));
}

#[test]
fn test_unknown_sheet_lists_available_sheets() {
    let dir = TempDir::new().unwrap();
    let path = two_sheet_workbook(&dir);
    let options = SourceOptions {
        sheet: Some("Brands".to_string()),
        ..SourceOptions::default()
    };

    match open_source(&path, &options).unwrap_err() {
        SourceError::Workbook { message, .. } => {
            assert!(message.contains("'Brands' not found"));
            assert!(message.contains("Notes, Directory"));
        },
        other => panic!("expected workbook error, got {:?}", other),
    }
}
