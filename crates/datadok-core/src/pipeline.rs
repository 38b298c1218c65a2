//! Entry points: resolve, fetch, lay out, decode, label, assemble.

use std::path::Path;

use tracing::{debug, info, info_span};

use datadok_fetch::{DatadokClient, DatadokConfig, MetadataSource, PathResolver};
use datadok_ingest::{DecodeOptions, LayoutOptions, build_layout, decode_file};
use datadok_model::{ArchiveMetadata, Result};

use crate::archive::ArchiveResult;
use crate::codelist::{build_codelists, enrich};

/// Settings for every stage of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub config: DatadokConfig,
    pub layout: LayoutOptions,
    pub decode: DecodeOptions,
}

impl ArchiveOptions {
    /// Defaults with the environment overrides of [`DatadokConfig::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            config: DatadokConfig::from_env(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DatadokConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_decode(mut self, decode: DecodeOptions) -> Self {
        self.decode = decode;
        self
    }
}

/// Reads an archive file described in Datadok, using environment defaults.
///
/// `path` may use `$STAMME` shortcuts, omit the file extension, or name a
/// year whose description lives under an earlier year.
pub fn open_archive(path: &str) -> Result<ArchiveResult> {
    open_archive_with(path, &ArchiveOptions::from_env())
}

/// Reads an archive file described in Datadok.
pub fn open_archive_with(path: &str, options: &ArchiveOptions) -> Result<ArchiveResult> {
    let span = info_span!("open_archive", path);
    let _guard = span.enter();

    let client = DatadokClient::new(options.config.clone())?;
    let resolved = PathResolver::new(&client, &options.config).resolve(path)?;
    debug!(metapath = %resolved.metapath, "Using description");
    read_archive(&resolved.metadata, &resolved.data_file, options)
}

/// Reads a data file using the description stored under another path.
pub fn open_archive_with_metapath(
    data_path: &str,
    metapath: &str,
    options: &ArchiveOptions,
) -> Result<ArchiveResult> {
    let span = info_span!("open_archive", path = data_path, metapath);
    let _guard = span.enter();

    let client = DatadokClient::new(options.config.clone())?;
    let metadata = client.fetch(metapath)?;
    let data_file = PathResolver::new(&client, &options.config).find_data_file(data_path)?;
    read_archive(&metadata, &data_file, options)
}

/// Reads a data file using a description from a URL or a local XML/JSON file.
pub fn import_archive(
    source: &MetadataSource,
    data_path: &Path,
    options: &ArchiveOptions,
) -> Result<ArchiveResult> {
    let span = info_span!("import_archive", source = %source, path = %data_path.display());
    let _guard = span.enter();

    let client = DatadokClient::new(options.config.clone())?;
    let metadata = client.fetch_source(source)?;
    read_archive(&metadata, data_path, options)
}

/// Decodes and labels a data file given its description.
///
/// The layout is validated before the data file is opened.
pub fn read_archive(
    metadata: &ArchiveMetadata,
    data_path: &Path,
    options: &ArchiveOptions,
) -> Result<ArchiveResult> {
    let layout = build_layout(metadata, &options.layout)?;
    debug!(
        fields = layout.len(),
        record_length = layout.record_length(),
        "Layout ready"
    );

    let decoded =
        info_span!("decode").in_scope(|| decode_file(data_path, &layout, &options.decode))?;
    let codelists = build_codelists(&metadata.codelists);
    let enrichment =
        info_span!("label").in_scope(|| enrich(&decoded.frame, &layout, &codelists))?;

    info!(
        rows = decoded.rows,
        columns = layout.len(),
        codelists = codelists.len(),
        unknown_codes = enrichment.unknown_codes.len(),
        "Archive read"
    );
    ArchiveResult::assemble(metadata, layout, decoded, codelists, enrichment, data_path)
}
