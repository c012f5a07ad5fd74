//! Delimited text adapter

use std::io::Cursor;
use std::path::Path;

use super::encoding::{DecodeOutcome, EncodingChain};
use super::{RawCell, RawRow, SourceFormat, SourceOptions, SourceTable};
use crate::error::{RowError, SourceError};

pub(crate) fn open(path: &Path, options: &SourceOptions) -> Result<SourceTable, SourceError> {
    let chain = EncodingChain::from_labels(&options.encodings).map_err(|label| {
        SourceError::Undecodable {
            path: path.to_path_buf(),
            tried: vec![format!("{} (unknown label)", label)],
        }
    })?;

    let bytes = std::fs::read(path).map_err(|e| SourceError::io(path, e))?;
    let (text, encoding) = match chain.decode(&bytes) {
        DecodeOutcome::Decoded(decoded) => (decoded.text.into_owned(), decoded.encoding.name()),
        DecodeOutcome::Exhausted(tried) => {
            return Err(SourceError::Undecodable {
                path: path.to_path_buf(),
                tried,
            })
        },
    };
    tracing::debug!(path = %path.display(), encoding, "Decoded text source");

    let delimiter = u8::try_from(options.delimiter).unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(text.into_bytes()));

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader.into_records().map(|result| match result {
        Ok(record) => {
            let number = record.position().map_or(0, |p| p.line() as usize);
            Ok(RawRow::new(number, record.iter().map(RawCell::text).collect()))
        },
        Err(err) => Err(RowError::Malformed {
            row: err.position().map_or(0, |p| p.line() as usize),
            message: err.to_string(),
        }),
    });

    SourceTable::new(
        path,
        SourceFormat::Csv {
            encoding: encoding.to_string(),
        },
        headers,
        &options.headers,
        Box::new(rows),
    )
}
