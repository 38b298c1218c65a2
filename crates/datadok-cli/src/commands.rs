use std::path::Path;

use anyhow::{Context, Result, bail};

use datadok_core::{
    ArchiveOptions, ArchiveResult, DecodeOptions, EncodingChoice, LayoutOptions, MetadataSource,
    PositionBase, import_archive, open_archive_with, open_archive_with_metapath,
};

use crate::cli::Cli;

/// Builds pipeline options from the command line and the environment.
pub fn archive_options(cli: &Cli) -> Result<ArchiveOptions> {
    let mut decode = DecodeOptions::default().with_parallel(!cli.no_parallel);
    if let Some(label) = &cli.encoding {
        let Some(choice) = EncodingChoice::from_label(label) else {
            bail!("unknown encoding label '{label}'");
        };
        decode = decode.with_encoding(choice);
    }
    let position_base = if cli.zero_based {
        PositionBase::ZeroBased
    } else {
        PositionBase::OneBased
    };
    Ok(ArchiveOptions::from_env()
        .with_layout(LayoutOptions::default().with_position_base(position_base))
        .with_decode(decode))
}

/// Reads the archive named on the command line.
///
/// A local data file with a URL or description file as `--metapath` skips
/// path resolution entirely.
pub fn run_read(cli: &Cli) -> Result<ArchiveResult> {
    let options = archive_options(cli)?;
    let archive = match cli.metapath.as_deref() {
        Some(metapath) if is_direct_source(metapath) && Path::new(&cli.path).is_file() => {
            let source = MetadataSource::parse(metapath);
            import_archive(&source, Path::new(&cli.path), &options)
        }
        Some(metapath) => open_archive_with_metapath(&cli.path, metapath, &options),
        None => open_archive_with(&cli.path, &options),
    };
    archive.with_context(|| format!("failed to read {}", cli.path))
}

fn is_direct_source(metapath: &str) -> bool {
    match MetadataSource::parse(metapath) {
        MetadataSource::Url(_) => true,
        MetadataSource::File(path) => path.is_file(),
    }
}
