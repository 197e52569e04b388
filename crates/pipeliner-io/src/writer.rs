use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::errors::WriteError;

/// Serialises `df` as UTF-8 CSV prefixed with a byte-order mark.
pub fn write_csv_to<W: Write>(df: &DataFrame, writer: W) -> PolarsResult<()> {
    let mut df = df.clone();
    CsvWriter::new(writer)
        .include_bom(true)
        .include_header(true)
        .finish(&mut df)
}

/// Writes `df` to `path`, replacing any existing file. The parent directory
/// must already exist.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<(), WriteError> {
    let file = File::create(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffer = BufWriter::new(file);

    write_csv_to(df, &mut buffer).map_err(|source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    buffer.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows = df.height(), "wrote CSV");
    Ok(())
}
