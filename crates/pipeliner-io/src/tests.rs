use std::fs;
use std::path::PathBuf;

use calamine::{ExcelDateTime, ExcelDateTimeType, Range};
use polars::prelude::*;

use crate::errors::ReadError;
use crate::excel::range_to_dataframe;
use crate::{
    decode_text, read_csv, read_csv_bytes, read_excel, resolve_encoding, write_csv, write_csv_to,
    ExcelOptions, DEFAULT_ENCODING,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .expect("missing column")
        .str()
        .expect("expected string column")
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

#[test]
fn reads_cp932_csv_as_strings() {
    let df = read_csv(&fixture("info_cp932.csv"), DEFAULT_ENCODING).expect("read failed");

    assert_eq!(df.get_column_names_str(), ["ID", "NAME", "LAT", "LONG"]);
    assert_eq!(df.height(), 3);
    for column in df.get_columns() {
        assert_eq!(column.dtype(), &DataType::String, "{}", column.name());
    }
    assert_eq!(
        strings(&df, "NAME"),
        vec![
            Some("北門".to_string()),
            Some("川岸".to_string()),
            Some("川岸(重複)".to_string())
        ]
    );
    assert_eq!(strings(&df, "LAT")[0].as_deref(), Some("35.68"));
}

#[test]
fn cp932_label_aliases_shift_jis() {
    let encoding = resolve_encoding("CP932").expect("cp932 should resolve");
    assert_eq!(encoding.name(), "Shift_JIS");
    assert_eq!(resolve_encoding("utf-8").unwrap().name(), "UTF-8");
    assert!(matches!(
        resolve_encoding("not-an-encoding"),
        Err(ReadError::UnknownEncoding { .. })
    ));
}

#[test]
fn utf8_bom_overrides_configured_encoding() {
    let encoding = resolve_encoding(DEFAULT_ENCODING).unwrap();
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("ID,NAME\n1,北門\n".as_bytes());

    let text = decode_text(&bytes, encoding).expect("decode failed");
    assert_eq!(text, "ID,NAME\n1,北門\n");
}

#[test]
fn malformed_bytes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    // 0x81 starts a two-byte Shift_JIS sequence; 0x20 is not a valid trail byte.
    fs::write(&path, b"ID,NAME\n1,\x81\x20\n").unwrap();

    let err = read_csv(&path, DEFAULT_ENCODING).unwrap_err();
    assert!(matches!(err, ReadError::Decode { .. }), "{err}");
}

#[test]
fn missing_csv_reports_path() {
    let err = read_csv(&fixture("does_not_exist.csv"), DEFAULT_ENCODING).unwrap_err();
    assert!(matches!(err, ReadError::Io { .. }));
    assert!(err.to_string().contains("does_not_exist.csv"));
}

#[test]
fn empty_fields_become_null() {
    let df = read_csv_bytes(b"ID,VALUE1\n1,\n2,3.5\n".to_vec()).expect("parse failed");
    assert_eq!(
        strings(&df, "VALUE1"),
        vec![None, Some("3.5".to_string())]
    );
}

#[test]
fn reads_excel_sheet_after_skipped_rows() {
    let df = read_excel(&fixture("id.xlsx"), &ExcelOptions::default()).expect("read failed");

    assert_eq!(df.get_column_names_str(), ["ID", "NAME", "AREA"]);
    assert_eq!(df.height(), 4);
    assert_eq!(
        strings(&df, "ID"),
        vec![
            Some("101".to_string()),
            Some("102".to_string()),
            Some("103".to_string()),
            Some("101".to_string())
        ]
    );
    assert_eq!(strings(&df, "NAME")[1].as_deref(), Some("River bank"));
}

#[test]
fn missing_sheet_is_an_error() {
    let options = ExcelOptions {
        sheet: "nope".to_string(),
        ..ExcelOptions::default()
    };
    let err = read_excel(&fixture("id.xlsx"), &options).unwrap_err();
    match err {
        ReadError::Sheet { sheet, message, .. } => {
            assert_eq!(sheet, "nope");
            assert!(message.contains("sample"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn skipping_past_the_sheet_is_an_error() {
    let options = ExcelOptions {
        skip_rows: 50,
        ..ExcelOptions::default()
    };
    let err = read_excel(&fixture("id.xlsx"), &options).unwrap_err();
    assert!(matches!(err, ReadError::Sheet { .. }), "{err}");
}

#[test]
fn excel_dates_render_as_iso_text() {
    let df = read_excel(&fixture("dates.xlsx"), &ExcelOptions::default()).expect("read failed");

    assert_eq!(df.get_column_names_str(), ["ID", "SURVEYED", "ELAPSED"]);
    assert_eq!(
        strings(&df, "SURVEYED"),
        vec![
            Some("2024-01-01".to_string()),
            Some("2024-01-01 12:00:00".to_string())
        ]
    );
    assert_eq!(
        strings(&df, "ELAPSED"),
        vec![Some("36:00:00".to_string()), Some("6:00:00".to_string())]
    );
}

#[test]
fn iso_date_cells_pass_through() -> PolarsResult<()> {
    let mut range = Range::new((0, 0), (1, 2));
    range.set_value((0, 0), calamine::Data::String("ID".into()));
    range.set_value((0, 1), calamine::Data::String("ON".into()));
    range.set_value((0, 2), calamine::Data::String("FOR".into()));
    range.set_value((1, 0), calamine::Data::Float(7.0));
    range.set_value((1, 1), calamine::Data::DateTimeIso("2024-03-05T08:30:00".into()));
    range.set_value((1, 2), calamine::Data::DurationIso("PT1H30M".into()));

    let df = range_to_dataframe(&range, 0)?.expect("header row");
    assert_eq!(strings(&df, "ID"), vec![Some("7".to_string())]);
    assert_eq!(strings(&df, "ON"), vec![Some("2024-03-05T08:30:00".to_string())]);
    assert_eq!(strings(&df, "FOR"), vec![Some("PT1H30M".to_string())]);
    Ok(())
}

#[test]
fn serial_datetime_cell_is_converted() -> PolarsResult<()> {
    let mut range = Range::new((0, 0), (1, 0));
    range.set_value((0, 0), calamine::Data::String("DAY".into()));
    range.set_value(
        (1, 0),
        calamine::Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false)),
    );

    let df = range_to_dataframe(&range, 0)?.expect("header row");
    assert_eq!(strings(&df, "DAY"), vec![Some("2024-01-01".to_string())]);
    Ok(())
}

#[test]
fn header_gaps_and_repeats_are_named() -> PolarsResult<()> {
    // Used range starts at sheet row 3; skipping three sheet rows leaves one
    // range row of notes before the header.
    let mut range = Range::new((2, 0), (9, 3));
    range.set_value((2, 0), calamine::Data::String("notes".into()));
    range.set_value((3, 0), calamine::Data::String("ID".into()));
    range.set_value((3, 2), calamine::Data::String("ID".into()));
    range.set_value((3, 3), calamine::Data::String("ID".into()));
    range.set_value((4, 0), calamine::Data::Float(1.0));
    range.set_value((4, 1), calamine::Data::String("a".into()));
    range.set_value((5, 0), calamine::Data::Float(2.0));
    range.set_value((5, 3), calamine::Data::String("b".into()));

    let df = range_to_dataframe(&range, 3)?.expect("header row");

    assert_eq!(
        df.get_column_names_str(),
        ["ID", "column_2", "ID_duplicated_0", "ID_duplicated_1"]
    );
    // rows 6..=9 are blank and dropped
    assert_eq!(df.height(), 2);
    assert_eq!(
        strings(&df, "ID"),
        vec![Some("1".to_string()), Some("2".to_string())]
    );
    assert_eq!(strings(&df, "column_2"), vec![Some("a".to_string()), None]);
    assert_eq!(strings(&df, "ID_duplicated_1"), vec![None, Some("b".to_string())]);
    Ok(())
}

#[test]
fn skip_rows_inside_unused_leading_rows_keep_the_header() -> PolarsResult<()> {
    // Header in sheet row 6 with nothing above it: the used range starts there.
    let mut range = Range::new((5, 0), (6, 0));
    range.set_value((5, 0), calamine::Data::String("ID".into()));
    range.set_value((6, 0), calamine::Data::Float(101.0));

    let df = range_to_dataframe(&range, 5)?.expect("header row");
    assert_eq!(df.get_column_names_str(), ["ID"]);
    assert_eq!(strings(&df, "ID"), vec![Some("101".to_string())]);
    Ok(())
}

#[test]
fn blank_header_names_follow_sheet_columns() -> PolarsResult<()> {
    // Used range starts at column B.
    let mut range = Range::new((0, 1), (1, 2));
    range.set_value((0, 1), calamine::Data::String("ID".into()));
    range.set_value((1, 1), calamine::Data::Float(5.0));
    range.set_value((1, 2), calamine::Data::String("x".into()));

    let df = range_to_dataframe(&range, 0)?.expect("header row");
    assert_eq!(df.get_column_names_str(), ["ID", "column_3"]);
    Ok(())
}

#[test]
fn written_csv_starts_with_bom() -> PolarsResult<()> {
    let df = df!(
        "ID" => ["1", "2"],
        "VALUE1" => [Some(1.5), None],
    )?;

    let mut buffer = Vec::new();
    write_csv_to(&df, &mut buffer)?;

    assert_eq!(&buffer[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(buffer[3..].to_vec()).expect("utf-8 output");
    assert_eq!(text, "ID,VALUE1\n1,1.5\n2,\n");
    Ok(())
}

#[test]
fn written_csv_reads_back_through_cp932_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let df = df!("ID" => ["101"], "NAME" => ["北門"]).unwrap();

    write_csv(&df, &path).expect("write failed");
    let back = read_csv(&path, DEFAULT_ENCODING).expect("read back failed");

    assert_eq!(strings(&back, "NAME"), vec![Some("北門".to_string())]);
}

#[test]
fn writing_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.csv");
    let df = df!("ID" => ["1"]).unwrap();

    assert!(write_csv(&df, &path).is_err());
}
