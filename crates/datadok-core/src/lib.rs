//! Reading Datadok-described fixed-width archives.
//!
//! The pipeline fetches the file description, builds a column layout, decodes
//! the data file, labels coded columns and assembles an [`ArchiveResult`]:
//!
//! ```ignore
//! let archive = datadok_core::open_archive("$UTD/nudb/arkiv/grunnskole/g2022")?;
//! println!("{}", archive.labelled().head(Some(5)));
//! for summary in archive.unknown_code_summary() {
//!     println!("{} {}: {} rows", summary.field, summary.code, summary.count);
//! }
//! ```

pub mod archive;
pub mod codelist;
pub mod pipeline;
pub mod tables;

pub use archive::ArchiveResult;
pub use codelist::{
    CodeLabel, CodelistResolver, Enrichment, LABEL_SUFFIX, build_codelists, enrich,
    label_column_name,
};
pub use pipeline::{
    ArchiveOptions, import_archive, open_archive, open_archive_with, open_archive_with_metapath,
    read_archive,
};
pub use tables::{codelist_table, metadata_table};

pub use datadok_fetch::{DatadokConfig, MetadataSource};
pub use datadok_ingest::{
    ColumnLayout, DecodeOptions, EncodingChoice, LayoutOptions, PositionBase,
};
pub use datadok_model::{
    ArchiveError, ArchiveMetadata, CodelistEntry, ColumnType, FieldDescriptor, Result,
    UNKNOWN_CODE_LABEL, UnknownCode, UnknownCodeSummary,
};
