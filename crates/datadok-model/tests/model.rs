#![allow(missing_docs)]

use datadok_model::{
    ArchiveMetadata, Codelist, CodelistEntry, ColumnType, DateFormat, FieldDescriptor, FieldType,
};

fn sample_metadata() -> ArchiveMetadata {
    ArchiveMetadata::new(
        vec![
            FieldDescriptor::new("id", 1, 5, "Heltall"),
            FieldDescriptor::new("name", 6, 10, "Tekst").with_description("Navn"),
            FieldDescriptor::new("status", 16, 2, "Tekst").with_codelist("S"),
        ],
        vec![
            CodelistEntry::new("S", "01", "Active").with_field("status"),
            CodelistEntry::new("S", "99", "Inactive").with_field("status"),
        ],
    )
    .with_division("S320")
}

#[test]
fn metadata_finds_fields_and_codelists() {
    let metadata = sample_metadata();
    assert_eq!(metadata.field("name").map(|f| f.width), Some(10));
    assert!(metadata.field("missing").is_none());
    assert_eq!(metadata.codelist_ids().into_iter().collect::<Vec<_>>(), vec!["S"]);
}

#[test]
fn metadata_serializes_to_json() {
    let metadata = sample_metadata();
    let json = serde_json::to_string(&metadata).expect("serialize metadata");
    let round: ArchiveMetadata = serde_json::from_str(&json).expect("deserialize metadata");
    assert_eq!(round, metadata);
}

#[test]
fn metadata_deserializes_minimal_json() {
    let json = r#"{
        "fields": [
            {"name": "dato", "start": 0, "width": 8, "datatype": "date"}
        ],
        "date_format": "%d%m%Y"
    }"#;
    let metadata: ArchiveMetadata = serde_json::from_str(json).expect("parse json");
    assert_eq!(metadata.fields.len(), 1);
    assert!(metadata.codelists.is_empty());
    assert_eq!(
        metadata.date_format,
        Some(DateFormat::new(DateFormat::DDMMYYYY))
    );
}

#[test]
fn column_type_serializes_with_kind_tag() {
    let json = serde_json::to_value(ColumnType::Decimal { precision: Some(1) })
        .expect("serialize column type");
    assert_eq!(json["kind"], "decimal");
    assert_eq!(json["precision"], 1);
    assert_eq!(FieldType::Numeric.to_string(), "numeric");
}

#[test]
fn deserialized_codelist_keeps_every_matcher() {
    let mut original = Codelist::new("S", "Status");
    original.insert("01", "Active");
    original.insert("a", "Lower");

    let json = serde_json::to_string(&original).expect("serialize codelist");
    let restored: Codelist = serde_json::from_str(&json).expect("deserialize codelist");

    assert_eq!(restored.len(), 2);
    assert_eq!(restored.lookup("01"), Some("Active"));
    assert_eq!(restored.lookup("1"), Some("Active"));
    assert_eq!(restored.lookup(" A "), Some("Lower"));
}
