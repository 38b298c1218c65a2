//! Data model for Datadok archive files.
//!
//! Datadok describes each legacy fixed-width archive file with a list of
//! context variables (name, start position, length, datatype) and optional
//! code lists. This crate holds those descriptions and the canonical types
//! derived from them, shared by the fetcher, the decoder and the resolver.

pub mod codelist;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod metadata;

pub use codelist::{CodeMatcher, Codelist, CodelistEntry};
pub use diagnostics::{UnknownCode, UnknownCodeSummary, summarize_unknown_codes};
pub use error::{ArchiveError, Result};
pub use field::{ColumnType, DateFormat, FieldDescriptor, FieldType};
pub use metadata::ArchiveMetadata;

/// Label attached to decoded codes that are missing from their code list.
pub const UNKNOWN_CODE_LABEL: &str = "<unknown code>";
