//! Non-fatal findings collected while labelling decoded data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A decoded code that has no entry in its code list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCode {
    /// 1-based line number in the archive file.
    pub line: usize,
    /// Field holding the code.
    pub field: String,
    /// The decoded value rendered as text.
    ///
    /// Integer fields report the parsed number, so a raw `03` appears as `3`.
    pub code: String,
}

/// Occurrences of one unknown code in one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCodeSummary {
    pub field: String,
    pub code: String,
    pub count: usize,
    pub first_line: usize,
}

/// Groups unknown-code diagnostics by (field, code).
pub fn summarize_unknown_codes(diagnostics: &[UnknownCode]) -> Vec<UnknownCodeSummary> {
    let mut grouped: BTreeMap<(&str, &str), UnknownCodeSummary> = BTreeMap::new();
    for diagnostic in diagnostics {
        grouped
            .entry((diagnostic.field.as_str(), diagnostic.code.as_str()))
            .and_modify(|summary| {
                summary.count += 1;
                summary.first_line = summary.first_line.min(diagnostic.line);
            })
            .or_insert_with(|| UnknownCodeSummary {
                field: diagnostic.field.clone(),
                code: diagnostic.code.clone(),
                count: 1,
                first_line: diagnostic.line,
            });
    }
    grouped.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown(line: usize, field: &str, code: &str) -> UnknownCode {
        UnknownCode {
            line,
            field: field.to_string(),
            code: code.to_string(),
        }
    }

    #[test]
    fn test_summary_groups_by_field_and_code() {
        let diagnostics = vec![
            unknown(9, "status", "77"),
            unknown(2, "status", "77"),
            unknown(4, "kjonn", "3"),
        ];
        let summary = summarize_unknown_codes(&diagnostics);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].field, "kjonn");
        assert_eq!(summary[1].count, 2);
        assert_eq!(summary[1].first_line, 2);
    }
}
