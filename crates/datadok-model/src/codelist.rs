//! Code lists: enumerations of (code, label) pairs for categorical fields.
//!
//! Datadok nests a code list inside the context variable it describes. The
//! fetcher flattens those into [`CodelistEntry`] rows, and the resolver groups
//! the rows into one [`Codelist`] per id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One (code, label) row of a code list, as delivered by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodelistEntry {
    /// Code-list id (the code-list title in Datadok).
    pub codelist: String,
    /// Code-list description.
    #[serde(default)]
    pub description: String,
    /// Name of the field the code list was declared on.
    #[serde(default)]
    pub field: String,
    /// The coded value as it appears in data.
    pub code: String,
    /// Human-readable label.
    pub label: String,
}

impl CodelistEntry {
    pub fn new(
        codelist: impl Into<String>,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            codelist: codelist.into(),
            description: String::new(),
            field: String::new(),
            code: code.into(),
            label: label.into(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Strategy for matching a raw value against the codes of a list.
///
/// Matchers are tried in declaration order; the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMatcher {
    /// Byte-for-byte equal code.
    Exact,
    /// Equal after trimming and uppercasing.
    CaseInsensitive,
    /// Equal as numbers ("1", "01" and "1.0" align).
    Numeric,
}

impl CodeMatcher {
    /// All matchers in priority order.
    pub const ORDER: [CodeMatcher; 3] = [Self::Exact, Self::CaseInsensitive, Self::Numeric];
}

/// A code list keyed by code, with label lookup.
///
/// Only the exact codes are serialized; deserializing rebuilds the
/// case-insensitive and numeric indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CodelistData")]
pub struct Codelist {
    /// Code-list id.
    pub id: String,
    /// Code-list description.
    pub description: String,
    /// Primary lookup: exact code.
    values: BTreeMap<String, String>,
    /// Trimmed uppercase codes.
    #[serde(skip)]
    values_upper: BTreeMap<String, String>,
    /// Numeric-normalized codes.
    #[serde(skip)]
    values_numeric: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct CodelistData {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

impl From<CodelistData> for Codelist {
    fn from(data: CodelistData) -> Self {
        let mut codelist = Self {
            id: data.id,
            description: data.description,
            values: data.values,
            ..Self::default()
        };
        codelist.rebuild_indexes();
        codelist
    }
}

impl Codelist {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Inserts a code-label pair.
    ///
    /// Returns false and keeps the existing label when the code is already present.
    pub fn insert(&mut self, code: &str, label: &str) -> bool {
        if self.values.contains_key(code) {
            return false;
        }
        self.values.insert(code.to_string(), label.to_string());
        self.values_upper
            .entry(code.trim().to_uppercase())
            .or_insert_with(|| label.to_string());
        if let Some(normalized) = normalize_numeric_key(code) {
            self.values_numeric
                .entry(normalized)
                .or_insert_with(|| label.to_string());
        }
        true
    }

    /// Looks up the label for a raw value, trying each matcher in priority order.
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        CodeMatcher::ORDER
            .iter()
            .find_map(|matcher| self.lookup_with(*matcher, raw))
    }

    /// Looks up a label using a single matcher.
    pub fn lookup_with(&self, matcher: CodeMatcher, raw: &str) -> Option<&str> {
        match matcher {
            CodeMatcher::Exact => self.values.get(raw),
            CodeMatcher::CaseInsensitive => self.values_upper.get(&raw.trim().to_uppercase()),
            CodeMatcher::Numeric => {
                normalize_numeric_key(raw).and_then(|key| self.values_numeric.get(&key))
            }
        }
        .map(String::as_str)
    }

    /// Returns true if the exact code is present.
    pub fn contains(&self, code: &str) -> bool {
        self.values.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over code-label pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn rebuild_indexes(&mut self) {
        self.values_upper.clear();
        self.values_numeric.clear();
        for (code, label) in &self.values {
            self.values_upper
                .entry(code.trim().to_uppercase())
                .or_insert_with(|| label.clone());
            if let Some(normalized) = normalize_numeric_key(code) {
                self.values_numeric
                    .entry(normalized)
                    .or_insert_with(|| label.clone());
            }
        }
    }
}

/// Normalizes a numeric string ("01" -> "1", "1.50" -> "1.5").
fn normalize_numeric_key(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let num: f64 = trimmed.parse().ok()?;
    if !num.is_finite() {
        return None;
    }
    let formatted = format!("{num}");
    if formatted.contains('.') {
        Some(
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
        )
    } else {
        Some(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_numeric_key() {
        assert_eq!(normalize_numeric_key("01"), Some("1".to_string()));
        assert_eq!(normalize_numeric_key("1.50"), Some("1.5".to_string()));
        assert_eq!(normalize_numeric_key("10"), Some("10".to_string()));
        assert_eq!(normalize_numeric_key("0.0"), Some("0".to_string()));
        assert_eq!(normalize_numeric_key("abc"), None);
        assert_eq!(normalize_numeric_key(""), None);
    }

    #[test]
    fn test_matchers_in_priority_order() {
        let mut cl = Codelist::new("S", "Status");
        cl.insert("01", "Active");
        cl.insert("1", "One");
        cl.insert("a", "Lower");

        assert_eq!(cl.lookup("01"), Some("Active"));
        assert_eq!(cl.lookup("1"), Some("One"));
        assert_eq!(cl.lookup("A"), Some("Lower"));
        assert_eq!(cl.lookup(" 01 "), Some("Active"));
        assert_eq!(cl.lookup_with(CodeMatcher::Exact, "A"), None);
        assert_eq!(cl.lookup("99"), None);
    }

    #[test]
    fn test_duplicate_code_keeps_first() {
        let mut cl = Codelist::new("S", "");
        assert!(cl.insert("01", "Active"));
        assert!(!cl.insert("01", "Other"));
        assert_eq!(cl.lookup("01"), Some("Active"));
        assert_eq!(cl.len(), 1);
    }
}
