//! Column layout derived from archive metadata.
//!
//! The layout is the decoder's view of a file description: every field
//! becomes a zero-based, half-open byte range with a canonical column type.
//! Fields are sorted by start offset, so declaration order in the metadata
//! does not matter. Gaps between fields are allowed; overlaps are not.

use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use datadok_model::{ArchiveError, ArchiveMetadata, ColumnType, DateFormat, FieldDescriptor, Result};

/// How declared start positions are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionBase {
    /// First byte of a record is position 1 (Datadok convention).
    #[default]
    OneBased,
    /// First byte of a record is position 0.
    ZeroBased,
}

/// Options for building a layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub position_base: PositionBase,
    /// Format for fields declared with the generic `date` type.
    ///
    /// Takes precedence over the archive-level format of the metadata.
    pub date_format: Option<DateFormat>,
}

impl LayoutOptions {
    #[must_use]
    pub fn with_position_base(mut self, base: PositionBase) -> Self {
        self.position_base = base;
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = Some(format);
        self
    }
}

/// One column of the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Zero-based byte offset.
    pub start: usize,
    pub width: usize,
    pub column_type: ColumnType,
    pub codelist: Option<String>,
}

impl ColumnSpec {
    /// Exclusive end offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.width
    }

    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Ordered, non-overlapping columns of a fixed-width record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    columns: Vec<ColumnSpec>,
    record_length: usize,
}

impl ColumnLayout {
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Minimum byte length of a record.
    #[must_use]
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builds the column layout for an archive description.
pub fn build_layout(metadata: &ArchiveMetadata, options: &LayoutOptions) -> Result<ColumnLayout> {
    let default_date = options
        .date_format
        .clone()
        .or_else(|| metadata.date_format.clone())
        .unwrap_or_default();

    let mut seen = BTreeSet::new();
    let mut columns = Vec::with_capacity(metadata.fields.len());
    for field in &metadata.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(ArchiveError::DuplicateFieldName {
                field: field.name.clone(),
            });
        }
        let start = normalize_start(field, options.position_base)?;
        let width = check_width(field)?;
        if start.checked_add(width).is_none() {
            return Err(ArchiveError::InvalidFieldPosition {
                field: field.name.clone(),
                reason: format!("start {} plus width {width} overflows", field.start),
            });
        }
        columns.push(ColumnSpec {
            name: field.name.clone(),
            start,
            width,
            column_type: resolve_column_type(field, &default_date)?,
            codelist: field.codelist.clone(),
        });
    }

    // Stable: fields sharing a start keep declaration order for the overlap report
    columns.sort_by_key(|c| c.start);

    for pair in columns.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if second.start < first.end() {
            return Err(ArchiveError::OverlappingFieldRanges {
                first: first.name.clone(),
                first_start: first.start,
                first_end: first.end(),
                second: second.name.clone(),
                second_start: second.start,
                second_end: second.end(),
            });
        }
    }

    let record_length = columns.iter().map(ColumnSpec::end).max().unwrap_or(0);
    tracing::debug!(
        columns = columns.len(),
        record_length,
        "Built column layout"
    );

    Ok(ColumnLayout {
        columns,
        record_length,
    })
}

fn normalize_start(field: &FieldDescriptor, base: PositionBase) -> Result<usize> {
    match base {
        PositionBase::ZeroBased => Ok(field.start),
        PositionBase::OneBased => {
            field
                .start
                .checked_sub(1)
                .ok_or_else(|| ArchiveError::InvalidFieldPosition {
                    field: field.name.clone(),
                    reason: "start position 0 with one-based positions".to_string(),
                })
        }
    }
}

fn check_width(field: &FieldDescriptor) -> Result<usize> {
    if field.width == 0 {
        return Err(ArchiveError::InvalidFieldPosition {
            field: field.name.clone(),
            reason: "width must be greater than 0".to_string(),
        });
    }
    Ok(field.width)
}

/// Maps a declared datatype to its canonical column type.
///
/// Datadok's Norwegian type names and plain English aliases are both
/// accepted, case-insensitively.
pub fn resolve_column_type(field: &FieldDescriptor, default_date: &DateFormat) -> Result<ColumnType> {
    let datatype = field.datatype.trim().to_lowercase();
    let column_type = match datatype.as_str() {
        "tekst" | "character" | "char" | "text" | "string" => ColumnType::Character,
        "heltall" | "numeric" | "integer" | "int" => ColumnType::Integer,
        "desimaltall" | "desim. (k)" | "desim. (p)" | "decimal" | "float" => ColumnType::Decimal {
            precision: field.precision,
        },
        "dato1" | "dato2" => {
            let pattern = match (datatype.as_str(), field.width) {
                ("dato1", 8) => DateFormat::YYYYMMDD,
                ("dato1", 6) => DateFormat::YYMMDD,
                ("dato2", 8) => DateFormat::DDMMYYYY,
                ("dato2", 6) => DateFormat::DDMMYY,
                _ => return Err(unsupported(field)),
            };
            ColumnType::Date {
                format: DateFormat::new(pattern),
            }
        }
        "date" => ColumnType::Date {
            format: default_date.clone(),
        },
        _ => return Err(unsupported(field)),
    };
    Ok(column_type)
}

fn unsupported(field: &FieldDescriptor) -> ArchiveError {
    ArchiveError::UnsupportedFieldType {
        field: field.name.clone(),
        datatype: field.datatype.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(fields: Vec<FieldDescriptor>) -> ArchiveMetadata {
        ArchiveMetadata::new(fields, Vec::new())
    }

    #[test]
    fn test_sorts_by_start() {
        let meta = metadata(vec![
            FieldDescriptor::new("status", 16, 2, "Tekst"),
            FieldDescriptor::new("id", 1, 5, "Heltall"),
            FieldDescriptor::new("name", 6, 10, "Tekst"),
        ]);
        let layout = build_layout(&meta, &LayoutOptions::default()).unwrap();
        assert_eq!(layout.names(), vec!["id", "name", "status"]);
        assert_eq!(layout.columns()[0].range(), 0..5);
        assert_eq!(layout.record_length(), 17);
    }

    #[test]
    fn test_zero_based_positions() {
        let meta = metadata(vec![FieldDescriptor::new("id", 0, 5, "numeric")]);
        let options = LayoutOptions::default().with_position_base(PositionBase::ZeroBased);
        let layout = build_layout(&meta, &options).unwrap();
        assert_eq!(layout.columns()[0].start, 0);

        let err = build_layout(&meta, &LayoutOptions::default()).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidFieldPosition { .. }));
    }

    #[test]
    fn test_overlap_reports_both_fields() {
        let meta = metadata(vec![
            FieldDescriptor::new("a", 1, 5, "Tekst"),
            FieldDescriptor::new("b", 5, 3, "Tekst"),
        ]);
        let err = build_layout(&meta, &LayoutOptions::default()).unwrap_err();
        match err {
            ArchiveError::OverlappingFieldRanges {
                first,
                second,
                first_end,
                second_start,
                ..
            } => {
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
                assert_eq!((first_end, second_start), (5, 4));
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn test_adjacent_and_gapped_fields_are_fine() {
        let meta = metadata(vec![
            FieldDescriptor::new("a", 1, 2, "Tekst"),
            FieldDescriptor::new("b", 3, 2, "Tekst"),
            FieldDescriptor::new("c", 10, 1, "Tekst"),
        ]);
        let layout = build_layout(&meta, &LayoutOptions::default()).unwrap();
        assert_eq!(layout.record_length(), 10);
    }

    #[test]
    fn test_zero_width_and_duplicates() {
        let meta = metadata(vec![FieldDescriptor::new("a", 1, 0, "Tekst")]);
        assert!(matches!(
            build_layout(&meta, &LayoutOptions::default()),
            Err(ArchiveError::InvalidFieldPosition { .. })
        ));

        let meta = metadata(vec![
            FieldDescriptor::new("a", 1, 1, "Tekst"),
            FieldDescriptor::new("a", 2, 1, "Tekst"),
        ]);
        assert!(matches!(
            build_layout(&meta, &LayoutOptions::default()),
            Err(ArchiveError::DuplicateFieldName { .. })
        ));
    }

    #[test]
    fn test_position_overflow_is_rejected() {
        let meta = metadata(vec![FieldDescriptor::new("a", usize::MAX, 2, "Tekst")]);
        let options = LayoutOptions::default().with_position_base(PositionBase::ZeroBased);
        let err = build_layout(&meta, &options).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidFieldPosition { ref field, .. } if field == "a"));
    }

    #[test]
    fn test_datadok_types() {
        let date = DateFormat::default();
        let resolve = |datatype: &str, width: usize| {
            resolve_column_type(&FieldDescriptor::new("f", 1, width, datatype), &date)
        };
        assert_eq!(resolve("Heltall", 3).unwrap(), ColumnType::Integer);
        assert_eq!(resolve(" TEKST ", 3).unwrap(), ColumnType::Character);
        assert_eq!(
            resolve("Desim. (K)", 6).unwrap(),
            ColumnType::Decimal { precision: None }
        );
        assert_eq!(
            resolve("Dato2", 6).unwrap(),
            ColumnType::Date {
                format: DateFormat::new(DateFormat::DDMMYY)
            }
        );
        assert_eq!(
            resolve("Dato1", 8).unwrap(),
            ColumnType::Date {
                format: DateFormat::new(DateFormat::YYYYMMDD)
            }
        );
        assert!(matches!(
            resolve("Dato1", 7),
            Err(ArchiveError::UnsupportedFieldType { .. })
        ));
        assert!(matches!(
            resolve("Blob", 7),
            Err(ArchiveError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_decimal_keeps_precision() {
        let field = FieldDescriptor::new("belop", 1, 8, "Desimaltall").with_precision(2);
        assert_eq!(
            resolve_column_type(&field, &DateFormat::default()).unwrap(),
            ColumnType::Decimal { precision: Some(2) }
        );
    }

    #[test]
    fn test_generic_date_format_precedence() {
        let meta = metadata(vec![FieldDescriptor::new("d", 1, 8, "date")])
            .with_date_format(DateFormat::new(DateFormat::DDMMYYYY));
        let layout = build_layout(&meta, &LayoutOptions::default()).unwrap();
        assert_eq!(
            layout.columns()[0].column_type,
            ColumnType::Date {
                format: DateFormat::new(DateFormat::DDMMYYYY)
            }
        );

        let options = LayoutOptions::default().with_date_format(DateFormat::new("%Y-%m-%d"));
        let layout = build_layout(&meta, &options).unwrap();
        assert_eq!(
            layout.columns()[0].column_type,
            ColumnType::Date {
                format: DateFormat::new("%Y-%m-%d")
            }
        );
    }
}
