use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown text encoding '{label}'")]
    UnknownEncoding { label: String },

    #[error("{} is not valid {encoding} text", .path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("failed to parse CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("failed to open workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet '{sheet}' in {}: {message}", .path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        message: String,
    },

    #[error("failed to build table from {}: {source}", .path.display())]
    Frame {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}
