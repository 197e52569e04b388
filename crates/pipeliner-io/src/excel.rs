use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader};
use chrono::NaiveTime;
use polars::prelude::*;
use tracing::debug;

use crate::errors::ReadError;

pub const DEFAULT_SHEET: &str = "sample";

/// Leading rows of the register sheet that hold titles and notes, not data.
pub const DEFAULT_SKIP_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelOptions {
    pub sheet: String,
    pub skip_rows: usize,
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            skip_rows: DEFAULT_SKIP_ROWS,
        }
    }
}

/// Reads one sheet of a workbook into an all-string DataFrame.
///
/// The first `skip_rows` sheet rows are discarded, the next row supplies the
/// column names and every following row is data. Trailing blank rows are
/// dropped. Date cells are rendered as ISO text rather than serial numbers.
pub fn read_excel(path: &Path, options: &ExcelOptions) -> Result<DataFrame, ReadError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| ReadError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == &options.sheet) {
        return Err(ReadError::Sheet {
            path: path.to_path_buf(),
            sheet: options.sheet.clone(),
            message: format!("not found (available: {})", sheet_names.join(", ")),
        });
    }

    let range = workbook
        .worksheet_range(&options.sheet)
        .map_err(|source| ReadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let df = range_to_dataframe(&range, options.skip_rows)
        .map_err(|source| ReadError::Frame {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| ReadError::Sheet {
            path: path.to_path_buf(),
            sheet: options.sheet.clone(),
            message: format!("no header row after skipping {} rows", options.skip_rows),
        })?;

    debug!(
        path = %path.display(),
        sheet = %options.sheet,
        rows = df.height(),
        columns = df.width(),
        "read workbook sheet"
    );
    Ok(df)
}

/// Returns `None` when the range has no row left to use as a header.
pub(crate) fn range_to_dataframe(
    range: &Range<Data>,
    skip_rows: usize,
) -> PolarsResult<Option<DataFrame>> {
    // Ranges begin at the first used cell, not at A1.
    let (first_row, first_col) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));
    let mut rows = range.rows().skip(skip_rows.saturating_sub(first_row));

    let Some(header) = rows.next() else {
        return Ok(None);
    };
    let names = header_names(header, first_col);

    let body: Vec<&[Data]> = rows.collect();
    let used = body
        .iter()
        .rposition(|row| row.iter().any(|cell| cell_text(cell).is_some()))
        .map_or(0, |idx| idx + 1);

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(used); names.len()];
    for row in &body[..used] {
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(row.get(idx).and_then(cell_text));
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(values)
        .map(|(name, column)| Column::new(name.into(), column))
        .collect();

    DataFrame::new(columns).map(Some)
}

/// Blank header cells are named after their sheet column (`column_1` is A).
fn header_names(header: &[Data], first_col: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = cell_text(cell)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| format!("column_{}", first_col + idx + 1));
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}_duplicated_{}", *count - 1)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Integral floats render without a fractional part, so an ID typed as the
/// number 101 matches the string "101" read from CSV.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) if text.is_empty() => None,
        Data::DateTime(value) => Some(datetime_text(value)),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Dates render as `%Y-%m-%d`, with the time appended when it is not
/// midnight. Durations render as `H:MM:SS` with unbounded hours.
fn datetime_text(value: &ExcelDateTime) -> String {
    if value.is_duration() {
        if let Some(duration) = value.as_duration() {
            let seconds = duration.num_seconds();
            let sign = if seconds < 0 { "-" } else { "" };
            let seconds = seconds.abs();
            return format!(
                "{sign}{}:{:02}:{:02}",
                seconds / 3600,
                seconds / 60 % 60,
                seconds % 60
            );
        }
    } else if let Some(datetime) = value.as_datetime() {
        return if datetime.time() == NaiveTime::MIN {
            datetime.format("%Y-%m-%d").to_string()
        } else {
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        };
    }
    value.as_f64().to_string()
}
