pub mod csv;
pub mod errors;
pub mod excel;
pub mod writer;

pub use csv::{decode_text, read_csv, read_csv_bytes, resolve_encoding, DEFAULT_ENCODING};
pub use errors::{ReadError, WriteError};
pub use excel::{read_excel, ExcelOptions, DEFAULT_SHEET, DEFAULT_SKIP_ROWS};
pub use writer::{write_csv, write_csv_to};

#[cfg(test)]
mod tests;
