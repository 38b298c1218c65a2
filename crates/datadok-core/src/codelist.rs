//! Code-list labelling of decoded archives.
//!
//! Raw coded columns are never modified. Every coded column gets a parallel
//! `<name>_label` String column; codes missing from their list are labelled
//! [`UNKNOWN_CODE_LABEL`] and reported as [`UnknownCode`] diagnostics.

use std::collections::BTreeMap;

use polars::prelude::*;

use datadok_ingest::ColumnLayout;
use datadok_model::{Codelist, CodelistEntry, Result, UNKNOWN_CODE_LABEL, UnknownCode};

/// Suffix of the label column added next to each coded column.
pub const LABEL_SUFFIX: &str = "_label";

/// Groups flat code-list rows into one [`Codelist`] per id.
///
/// A code repeated within a list keeps its first label.
pub fn build_codelists(entries: &[CodelistEntry]) -> BTreeMap<String, Codelist> {
    let mut codelists: BTreeMap<String, Codelist> = BTreeMap::new();
    for entry in entries {
        let codelist = codelists
            .entry(entry.codelist.clone())
            .or_insert_with(|| Codelist::new(entry.codelist.clone(), entry.description.clone()));
        if !codelist.insert(&entry.code, &entry.label) {
            tracing::warn!(
                codelist = %entry.codelist,
                code = %entry.code,
                ignored_label = %entry.label,
                "Duplicate code in code list, keeping first label"
            );
        }
    }
    codelists
}

/// Name of the label column for a coded column.
pub fn label_column_name(column: &str) -> String {
    format!("{column}{LABEL_SUFFIX}")
}

/// Outcome of looking up one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLabel<'a> {
    /// The code has a label.
    Label(&'a str),
    /// The field is coded but its list lacks this code.
    Unknown,
    /// The field has no usable code list.
    NotCoded,
}

/// Looks up labels for coded fields of one layout.
#[derive(Debug, Clone)]
pub struct CodelistResolver<'a> {
    /// Field name to its code list.
    fields: BTreeMap<&'a str, &'a Codelist>,
}

impl<'a> CodelistResolver<'a> {
    /// Pairs each coded column with its code list.
    ///
    /// Columns referencing a list that does not exist are left unlabelled.
    pub fn new(layout: &'a ColumnLayout, codelists: &'a BTreeMap<String, Codelist>) -> Self {
        let mut fields = BTreeMap::new();
        for column in layout.iter() {
            let Some(id) = column.codelist.as_deref() else {
                continue;
            };
            match codelists.get(id) {
                Some(codelist) => {
                    fields.insert(column.name.as_str(), codelist);
                }
                None => tracing::warn!(
                    field = %column.name,
                    codelist = id,
                    "Field references a missing code list, leaving it unlabelled"
                ),
            }
        }
        Self { fields }
    }

    /// Coded field names, sorted.
    pub fn coded_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().copied()
    }

    pub fn resolve(&self, field: &str, raw: &str) -> CodeLabel<'a> {
        match self.fields.get(field).copied() {
            None => CodeLabel::NotCoded,
            Some(codelist) => codelist
                .lookup(raw.trim())
                .map_or(CodeLabel::Unknown, CodeLabel::Label),
        }
    }

    /// Label for a raw value of a field.
    ///
    /// Unknown codes yield [`UNKNOWN_CODE_LABEL`]; fields without a code list
    /// yield `None`.
    pub fn label(&self, field: &str, raw: &str) -> Option<&'a str> {
        match self.resolve(field, raw) {
            CodeLabel::Label(label) => Some(label),
            CodeLabel::Unknown => Some(UNKNOWN_CODE_LABEL),
            CodeLabel::NotCoded => None,
        }
    }
}

/// A decoded table with label columns added.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub labelled: DataFrame,
    pub unknown_codes: Vec<UnknownCode>,
}

/// Adds a `<name>_label` column after every coded column.
///
/// Nulls stay null. Each unknown code adds one diagnostic with its 1-based
/// line number; labelling carries on. Codes are matched and reported in their
/// decoded form: integer columns lose leading zeros before lookup.
pub fn enrich(
    table: &DataFrame,
    layout: &ColumnLayout,
    codelists: &BTreeMap<String, Codelist>,
) -> Result<Enrichment> {
    let resolver = CodelistResolver::new(layout, codelists);
    let mut columns: Vec<Column> = Vec::with_capacity(table.width() + resolver.fields.len());
    let mut unknown_codes = Vec::new();

    for column in table.get_columns() {
        columns.push(column.clone());
        let name = column.name().as_str();
        if !resolver.fields.contains_key(name) {
            continue;
        }

        let raw = column.cast(&DataType::String)?;
        let raw = raw.str()?;
        let mut builder =
            StringChunkedBuilder::new(label_column_name(name).as_str().into(), table.height());
        for (index, value) in raw.iter().enumerate() {
            let Some(value) = value else {
                builder.append_null();
                continue;
            };
            match resolver.resolve(name, value) {
                CodeLabel::Label(label) => builder.append_value(label),
                CodeLabel::Unknown | CodeLabel::NotCoded => {
                    builder.append_value(UNKNOWN_CODE_LABEL);
                    unknown_codes.push(UnknownCode {
                        line: index + 1,
                        field: name.to_string(),
                        code: value.to_string(),
                    });
                }
            }
        }
        columns.push(builder.finish().into_series().into());
    }

    if !unknown_codes.is_empty() {
        tracing::warn!(
            count = unknown_codes.len(),
            "Decoded values missing from their code lists"
        );
    }

    Ok(Enrichment {
        labelled: DataFrame::new(columns)?,
        unknown_codes,
    })
}
