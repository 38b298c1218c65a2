//! Rendering typed rows back into fixed-width records.

use datadok_model::{ArchiveError, ColumnType, Result};

use crate::layout::{ColumnLayout, ColumnSpec};
use crate::value::Value;

/// Renders one row as a fixed-width line of `record_length` bytes.
///
/// Integers are zero padded, decimals carry an explicit `.`, text is left
/// aligned and nulls are blank. Decoding the line with the same layout gives
/// back the same values.
pub fn encode_row(layout: &ColumnLayout, values: &[Value]) -> Result<String> {
    if values.len() != layout.len() {
        return Err(ArchiveError::EncodeError {
            field: String::new(),
            reason: format!(
                "row has {} values, layout has {} columns",
                values.len(),
                layout.len()
            ),
        });
    }

    let mut line = String::with_capacity(layout.record_length());
    for (column, value) in layout.iter().zip(values) {
        let text = render(column, value)?;
        if text.len() > column.width {
            return Err(encode_error(
                column,
                format!("'{text}' is wider than {} bytes", column.width),
            ));
        }
        let pad_to = column.start.saturating_sub(line.len());
        line.extend(std::iter::repeat_n(' ', pad_to));
        line.push_str(&text);
        line.extend(std::iter::repeat_n(' ', column.width - text.len()));
    }
    Ok(line)
}

fn render(column: &ColumnSpec, value: &Value) -> Result<String> {
    let text = match (&column.column_type, value) {
        (_, Value::Null) => String::new(),
        (ColumnType::Integer, Value::Integer(v)) => format!("{v:0width$}", width = column.width),
        (ColumnType::Decimal { precision }, Value::Decimal(v)) => match precision {
            Some(p) => format!("{v:.prec$}", prec = *p as usize),
            None => {
                let text = v.to_string();
                if text.contains('.') {
                    text
                } else {
                    format!("{text}.0")
                }
            }
        },
        (ColumnType::Character, Value::Text(v)) => {
            if v.trim() != v || v.is_empty() {
                return Err(encode_error(
                    column,
                    "empty or blank-padded text would not survive decoding",
                ));
            }
            v.clone()
        }
        (ColumnType::Date { format }, Value::Date(v)) => v.format(format.pattern()).to_string(),
        (column_type, value) => {
            return Err(encode_error(
                column,
                format!("{value:?} does not fit column type {column_type}"),
            ));
        }
    };
    Ok(text)
}

fn encode_error(column: &ColumnSpec, reason: impl Into<String>) -> ArchiveError {
    ArchiveError::EncodeError {
        field: column.name.clone(),
        reason: reason.into(),
    }
}
