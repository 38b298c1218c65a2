//! The archive description fetched from the metadata service.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::codelist::CodelistEntry;
use crate::field::{DateFormat, FieldDescriptor};

/// Field and code-list descriptions for one archive file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Flattened code-list rows.
    #[serde(default)]
    pub codelists: Vec<CodelistEntry>,
    /// Owning division, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    /// Archive-level date format for fields declared as plain `date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
}

impl ArchiveMetadata {
    pub fn new(fields: Vec<FieldDescriptor>, codelists: Vec<CodelistEntry>) -> Self {
        Self {
            fields,
            codelists,
            division: None,
            date_format: None,
        }
    }

    #[must_use]
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = Some(format);
        self
    }

    /// Finds a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Distinct code-list ids, sorted.
    pub fn codelist_ids(&self) -> BTreeSet<&str> {
        self.codelists
            .iter()
            .map(|entry| entry.codelist.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
