use std::fs;
use std::io::Cursor;
use std::path::Path;

use encoding_rs::{Encoding, SHIFT_JIS};
use polars::prelude::*;
use tracing::debug;

use crate::errors::ReadError;

/// Encoding the model CSV files are exported in.
pub const DEFAULT_ENCODING: &str = "cp932";

/// Looks up an encoding by label. Accepts the WHATWG labels understood by
/// `encoding_rs` plus the Windows code-page names `cp932`/`932`, which map to
/// Shift_JIS (the WHATWG Shift_JIS decoder is the Windows-31J variant).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ReadError> {
    match label.trim().to_ascii_lowercase().as_str() {
        "cp932" | "932" | "windows-932" => Ok(SHIFT_JIS),
        other => Encoding::for_label(other.as_bytes()).ok_or_else(|| ReadError::UnknownEncoding {
            label: label.to_string(),
        }),
    }
}

/// Decodes `bytes` to UTF-8. A byte-order mark overrides `encoding`, so files
/// re-saved as UTF-8 with BOM still load. Returns `None` on malformed input.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        return None;
    }
    if actual != encoding {
        debug!(
            requested = encoding.name(),
            detected = actual.name(),
            "byte-order mark overrides configured encoding"
        );
    }
    Some(text.into_owned())
}

/// Parses UTF-8 CSV with a header row. Every column is read as a string.
pub fn read_csv_bytes(bytes: Vec<u8>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Reads a CSV file written in `encoding` into an all-string DataFrame.
pub fn read_csv(path: &Path, encoding: &str) -> Result<DataFrame, ReadError> {
    let encoding = resolve_encoding(encoding)?;
    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let text = decode_text(&bytes, encoding).ok_or_else(|| ReadError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name(),
    })?;

    let df = read_csv_bytes(text.into_bytes()).map_err(|source| ReadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read CSV"
    );
    Ok(df)
}
