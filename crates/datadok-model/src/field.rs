//! Field descriptors and canonical column types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A field as declared in the archive metadata.
///
/// `start` is kept exactly as declared; the layout builder normalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within one metadata document.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Declared start position.
    pub start: usize,
    /// Width in bytes.
    pub width: usize,
    /// Declared datatype (e.g. "Tekst", "Heltall", "Dato1", "numeric").
    pub datatype: String,
    /// Implied decimal places for decimal fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Id of the code list used to label this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codelist: Option<String>,
}

impl FieldDescriptor {
    /// Creates a descriptor with the required attributes.
    pub fn new(
        name: impl Into<String>,
        start: usize,
        width: usize,
        datatype: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            start,
            width,
            datatype: datatype.into(),
            precision: None,
            codelist: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the implied decimal precision.
    #[must_use]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the referenced code list id.
    #[must_use]
    pub fn with_codelist(mut self, codelist: impl Into<String>) -> Self {
        self.codelist = Some(codelist.into());
        self
    }
}

/// Canonical three-way classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Numeric,
    Character,
    Date,
}

impl FieldType {
    /// Lowercase name used in tables and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Character => "character",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `chrono` format pattern for date fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateFormat(String);

impl DateFormat {
    /// Datadok `Dato1`, 8 wide.
    pub const YYYYMMDD: &'static str = "%Y%m%d";
    /// Datadok `Dato1`, 6 wide.
    pub const YYMMDD: &'static str = "%y%m%d";
    /// Datadok `Dato2`, 8 wide.
    pub const DDMMYYYY: &'static str = "%d%m%Y";
    /// Datadok `Dato2`, 6 wide.
    pub const DDMMYY: &'static str = "%d%m%y";

    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.0
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::new(Self::YYYYMMDD)
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved type of a decoded column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers, decoded as `i64`.
    Integer,
    /// Decimal numbers, decoded as `f64`.
    ///
    /// Values without a decimal separator are scaled by `10^-precision`.
    Decimal { precision: Option<u32> },
    /// Trimmed text.
    Character,
    /// Calendar dates in the given format.
    Date { format: DateFormat },
}

impl ColumnType {
    /// Canonical classification of this column type.
    #[must_use]
    pub const fn kind(&self) -> FieldType {
        match self {
            Self::Integer | Self::Decimal { .. } => FieldType::Numeric,
            Self::Character => FieldType::Character,
            Self::Date { .. } => FieldType::Date,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.kind() == FieldType::Numeric
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Decimal {
                precision: Some(precision),
            } => write!(f, "decimal({precision})"),
            Self::Decimal { precision: None } => f.write_str("decimal"),
            Self::Character => f.write_str("character"),
            Self::Date { format } => write!(f, "date({format})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_kind() {
        assert_eq!(ColumnType::Integer.kind(), FieldType::Numeric);
        assert_eq!(
            ColumnType::Decimal { precision: Some(2) }.kind(),
            FieldType::Numeric
        );
        assert_eq!(ColumnType::Character.kind(), FieldType::Character);
        assert_eq!(
            ColumnType::Date {
                format: DateFormat::default()
            }
            .kind(),
            FieldType::Date
        );
    }

    #[test]
    fn test_column_type_display() {
        assert_eq!(
            ColumnType::Decimal { precision: Some(2) }.to_string(),
            "decimal(2)"
        );
        assert_eq!(
            ColumnType::Date {
                format: DateFormat::new(DateFormat::DDMMYY)
            }
            .to_string(),
            "date(%d%m%y)"
        );
    }
}
