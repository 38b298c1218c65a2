//! The assembled result of reading one archive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use polars::prelude::DataFrame;

use datadok_ingest::{ColumnLayout, DecodedArchive};
use datadok_model::{
    ArchiveMetadata, Codelist, ColumnType, Result, UnknownCode, UnknownCodeSummary,
    summarize_unknown_codes,
};

use crate::codelist::Enrichment;
use crate::tables::{codelist_table, metadata_table};

/// Decoded data, labels and descriptive tables for one archive file.
#[derive(Debug, Clone)]
pub struct ArchiveResult {
    data: DataFrame,
    labelled: DataFrame,
    metadata_table: DataFrame,
    codelist_table: DataFrame,
    codelists: BTreeMap<String, Codelist>,
    layout: ColumnLayout,
    unknown_codes: Vec<UnknownCode>,
    encoding: &'static Encoding,
    source: PathBuf,
}

impl ArchiveResult {
    /// Assembles the result from the pipeline stages. Does no I/O.
    pub fn assemble(
        metadata: &ArchiveMetadata,
        layout: ColumnLayout,
        decoded: DecodedArchive,
        codelists: BTreeMap<String, Codelist>,
        enrichment: Enrichment,
        source: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            metadata_table: metadata_table(metadata, &layout)?,
            codelist_table: codelist_table(&metadata.codelists)?,
            data: decoded.frame,
            labelled: enrichment.labelled,
            codelists,
            layout,
            unknown_codes: enrichment.unknown_codes,
            encoding: decoded.encoding,
            source: source.into(),
        })
    }

    /// Decoded table, one column per field in layout order.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Decoded table plus a `<name>_label` column per coded field.
    pub fn labelled(&self) -> &DataFrame {
        &self.labelled
    }

    pub fn metadata_table(&self) -> &DataFrame {
        &self.metadata_table
    }

    pub fn codelist_table(&self) -> &DataFrame {
        &self.codelist_table
    }

    pub fn codelists(&self) -> &BTreeMap<String, Codelist> {
        &self.codelists
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Field names in layout order.
    pub fn names(&self) -> Vec<&str> {
        self.layout.names()
    }

    /// Resolved column type per field, in layout order.
    pub fn datatypes(&self) -> Vec<(&str, &ColumnType)> {
        self.layout
            .iter()
            .map(|column| (column.name.as_str(), &column.column_type))
            .collect()
    }

    /// Width in bytes per field, in layout order.
    pub fn widths(&self) -> Vec<(&str, usize)> {
        self.layout
            .iter()
            .map(|column| (column.name.as_str(), column.width))
            .collect()
    }

    pub fn unknown_codes(&self) -> &[UnknownCode] {
        &self.unknown_codes
    }

    /// Unknown codes grouped by field and code.
    pub fn unknown_code_summary(&self) -> Vec<UnknownCodeSummary> {
        summarize_unknown_codes(&self.unknown_codes)
    }

    /// Encoding the data file was decoded with.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Data file the archive was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}
