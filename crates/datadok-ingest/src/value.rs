//! Typed cell values and the text-to-value conversions.

use chrono::NaiveDate;

use datadok_model::{ArchiveError, ColumnType, Result};

use crate::layout::ColumnSpec;

/// A decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Converts one trimmed field value to its typed form.
///
/// `text` must already be trimmed and checked against the missing markers.
pub(crate) fn parse_value(column: &ColumnSpec, text: &str, line: usize) -> Result<Value> {
    match &column.column_type {
        ColumnType::Character => Ok(Value::Text(text.to_string())),
        ColumnType::Integer => text
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| numeric_error(column, text, line)),
        ColumnType::Decimal { precision } => parse_decimal(text, *precision)
            .map(Value::Decimal)
            .ok_or_else(|| numeric_error(column, text, line)),
        ColumnType::Date { format } => NaiveDate::parse_from_str(text, format.pattern())
            .map(Value::Date)
            .map_err(|_| ArchiveError::DateParseError {
                field: column.name.clone(),
                line,
                value: text.to_string(),
                format: format.pattern().to_string(),
            }),
    }
}

/// Parses a decimal field.
///
/// Values with a separator (`,` or `.`) are read literally, a comma being the
/// decimal point. Bare digit strings carry implied decimals and are scaled by
/// `10^-precision`.
pub(crate) fn parse_decimal(text: &str, precision: Option<u32>) -> Option<f64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let well_formed = digits.bytes().any(|b| b.is_ascii_digit())
        && digits
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b == b',');
    if !well_formed {
        return None;
    }

    if text.contains([',', '.']) {
        return text.replace(',', ".").parse().ok();
    }

    let value: f64 = text.parse().ok()?;
    match precision {
        Some(p) if p > 0 => Some(value / 10f64.powi(i32::try_from(p).ok()?)),
        _ => Some(value),
    }
}

fn numeric_error(column: &ColumnSpec, text: &str, line: usize) -> ArchiveError {
    ArchiveError::NumericParseError {
        field: column.name.clone(),
        line,
        value: text.to_string(),
    }
}
