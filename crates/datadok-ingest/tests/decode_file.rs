//! Decoding archive files from disk.

use std::fs;

use datadok_ingest::{DecodeOptions, EncodingChoice, LayoutOptions, build_layout, decode_file};
use datadok_model::{ArchiveError, ArchiveMetadata, FieldDescriptor};
use polars::prelude::*;

fn metadata() -> ArchiveMetadata {
    ArchiveMetadata::new(
        vec![
            FieldDescriptor::new("kommnr", 1, 4, "Tekst"),
            FieldDescriptor::new("navn", 5, 8, "Tekst"),
            FieldDescriptor::new("belop", 13, 6, "Desim. (K)").with_precision(2),
            FieldDescriptor::new("antall", 19, 3, "Heltall"),
        ],
        Vec::new(),
    )
}

#[test]
fn decodes_latin1_file_with_implied_decimals() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("g2020.dat");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"0301Oslo    012345 12\r\n");
    bytes.extend_from_slice(b"1201Bj");
    bytes.push(0xF8); // 'ø' in latin1
    bytes.extend_from_slice(b"rgvin  12,5  .\r\n");
    fs::write(&path, &bytes).expect("write archive");

    let layout = build_layout(&metadata(), &LayoutOptions::default()).expect("layout");
    let decoded = decode_file(&path, &layout, &DecodeOptions::default()).expect("decode");

    assert_eq!(decoded.rows, 2);
    assert_eq!(decoded.encoding.name(), "windows-1252");

    let frame = &decoded.frame;
    let kommnr: Vec<Option<&str>> = frame
        .column("kommnr")
        .expect("kommnr")
        .str()
        .expect("str")
        .iter()
        .collect();
    assert_eq!(kommnr, vec![Some("0301"), Some("1201")]);

    let navn = frame.column("navn").expect("navn").str().expect("str").get(1);
    assert_eq!(navn, Some("Bjørgvin"));

    let belop: Vec<Option<f64>> = frame
        .column("belop")
        .expect("belop")
        .f64()
        .expect("f64")
        .iter()
        .collect();
    assert_eq!(belop, vec![Some(123.45), Some(12.5)]);

    let antall = frame.column("antall").expect("antall");
    assert_eq!(antall.dtype(), &DataType::Int8);
    assert_eq!(antall.null_count(), 1);
}

#[test]
fn explicit_encoding_overrides_detection() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("g2020.dat");
    fs::write(&path, "0301Oslo    012345 12\n").expect("write archive");

    let layout = build_layout(&metadata(), &LayoutOptions::default()).expect("layout");
    let options = DecodeOptions::default()
        .with_encoding(EncodingChoice::from_label("iso-8859-1").expect("label"))
        .with_parallel(false);
    let decoded = decode_file(&path, &layout, &options).expect("decode");
    assert_eq!(decoded.encoding.name(), "windows-1252");
}

#[test]
fn missing_file_is_reported() {
    let layout = build_layout(&metadata(), &LayoutOptions::default()).expect("layout");
    let err = decode_file(
        std::path::Path::new("/nonexistent/g2020.dat"),
        &layout,
        &DecodeOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ArchiveError::DataFileNotFound { .. }));
}

#[test]
fn custom_missing_markers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("g2020.dat");
    fs::write(&path, "9999Oslo    012345999\n").expect("write archive");

    let layout = build_layout(&metadata(), &LayoutOptions::default()).expect("layout");
    let options = DecodeOptions::default().with_missing_markers(["9999", "999"]);
    let decoded = decode_file(&path, &layout, &options).expect("decode");
    assert_eq!(decoded.frame.column("kommnr").expect("kommnr").null_count(), 1);
    assert_eq!(decoded.frame.column("antall").expect("antall").null_count(), 1);
}

fn place_layout() -> datadok_ingest::ColumnLayout {
    let metadata = ArchiveMetadata::new(vec![FieldDescriptor::new("sted", 1, 4, "Tekst")], Vec::new());
    build_layout(&metadata, &LayoutOptions::default()).expect("layout")
}

#[test]
fn latin1_after_a_long_ascii_head_is_kept() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("steder.dat");
    let mut bytes = b"Oslo\n".repeat(20_000);
    bytes.extend_from_slice(b"B\xF8rg\n");
    fs::write(&path, &bytes).expect("write archive");

    let decoded =
        decode_file(&path, &place_layout(), &DecodeOptions::default()).expect("decode");
    assert_eq!(decoded.encoding.name(), "windows-1252");
    let last = decoded
        .frame
        .column("sted")
        .expect("sted")
        .str()
        .expect("string column")
        .get(20_000)
        .map(str::to_string);
    assert_eq!(last.as_deref(), Some("Børg"));
}

#[test]
fn invalid_utf8_is_an_error_not_a_replacement() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("steder.dat");
    fs::write(&path, b"Oslo\nB\xF8rg\n").expect("write archive");

    let options = DecodeOptions::default()
        .with_encoding(EncodingChoice::from_label("utf-8").expect("label"));
    let err = decode_file(&path, &place_layout(), &options).unwrap_err();
    match err {
        ArchiveError::MalformedText { field, line, encoding } => {
            assert_eq!((field.as_str(), line, encoding.as_str()), ("sted", 2, "UTF-8"));
        }
        other => panic!("expected MalformedText, got {other:?}"),
    }
}
