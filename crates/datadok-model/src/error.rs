//! Error types for archive reading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while fetching metadata, building a layout or decoding an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    // === Metadata ===
    /// The metadata service could not be reached or returned something unusable.
    #[error("metadata unavailable for {source_name}: {reason}")]
    MetadataUnavailable { source_name: String, reason: String },

    /// No metadata was found for any candidate of an archive path.
    #[error("no Datadok description found for {path} (tried {tried} candidates)")]
    ArchivePathNotFound { path: String, tried: usize },

    /// The data file could not be located on disk.
    #[error("no data file found on disk for {path}")]
    DataFileNotFound { path: String },

    /// The stamme shortcut file is missing or malformed.
    #[error("invalid stamme file {path}: {reason}")]
    StammeFile { path: PathBuf, reason: String },

    // === Layout ===
    /// Two fields claim overlapping byte ranges.
    #[error(
        "fields '{first}' ({first_start}..{first_end}) and '{second}' ({second_start}..{second_end}) overlap"
    )]
    OverlappingFieldRanges {
        first: String,
        first_start: usize,
        first_end: usize,
        second: String,
        second_start: usize,
        second_end: usize,
    },

    /// A declared datatype has no canonical mapping.
    #[error("field '{field}' has unsupported datatype '{datatype}'")]
    UnsupportedFieldType { field: String, datatype: String },

    /// A start position or width cannot describe a byte range.
    #[error("field '{field}' has invalid position: {reason}")]
    InvalidFieldPosition { field: String, reason: String },

    /// Two fields share a name.
    #[error("field name '{field}' is declared more than once")]
    DuplicateFieldName { field: String },

    // === Decoding ===
    /// A record is shorter than the layout requires.
    #[error("line {line} is {actual} bytes, layout requires at least {expected}")]
    RecordTooShort {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A date field does not match its format.
    #[error("line {line}, field '{field}': '{value}' does not match date format {format}")]
    DateParseError {
        field: String,
        line: usize,
        value: String,
        format: String,
    },

    /// A numeric field does not hold a number.
    #[error("line {line}, field '{field}': '{value}' is not a number")]
    NumericParseError {
        field: String,
        line: usize,
        value: String,
    },

    /// A field's bytes are not valid in the file's encoding.
    #[error("line {line}, field '{field}': bytes are not valid {encoding}")]
    MalformedText {
        field: String,
        line: usize,
        encoding: String,
    },

    /// The archive uses an encoding the line reader cannot split.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding { path: PathBuf, encoding: String },

    /// A typed value cannot be written back into its fixed-width slot.
    #[error("cannot encode field '{field}': {reason}")]
    EncodeError { field: String, reason: String },

    // === I/O and frames ===
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A DataFrame operation failed.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl ArchiveError {
    /// Creates a `MetadataUnavailable` error.
    pub fn metadata_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MetadataUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the 1-based line number for per-record errors.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::RecordTooShort { line, .. }
            | Self::DateParseError { line, .. }
            | Self::NumericParseError { line, .. }
            | Self::MalformedText { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns true when the metadata itself is inconsistent.
    ///
    /// These errors are raised before any data file is opened.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::OverlappingFieldRanges { .. }
                | Self::UnsupportedFieldType { .. }
                | Self::InvalidFieldPosition { .. }
                | Self::DuplicateFieldName { .. }
        )
    }
}

impl From<polars::prelude::PolarsError> for ArchiveError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
