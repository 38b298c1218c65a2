//! Datadok metadata fetching.
//!
//! Datadok is the metadata service describing legacy fixed-width archive
//! files. This crate turns an archive path into an [`ArchiveMetadata`]:
//!
//! - **Parsing**: Datadok XML file descriptions and JSON documents
//! - **Fetching**: one blocking HTTP GET per description, no retries
//! - **Path resolution**: `$STAMME` shortcuts, PII twins, file extensions and
//!   looking back in time for yearly archives
//!
//! # Example
//!
//! ```ignore
//! use datadok_fetch::{DatadokClient, DatadokConfig};
//!
//! let client = DatadokClient::new(DatadokConfig::from_env())?;
//! let metadata = client.fetch("$ENERGI/er_eb/arkiv/grunnlag/g1990")?;
//! println!("{} fields", metadata.fields.len());
//! ```

mod client;
mod config;
mod parse;
mod paths;
mod resolver;
mod source;

pub use client::DatadokClient;
pub use config::{DEFAULT_ENDPOINT, DEFAULT_STAMME_FILE, DatadokConfig};
pub use parse::{parse_metadata, parse_metadata_json, parse_metadata_xml};
pub use paths::{Candidate, StammeVariables, path_combinations, previous_year_path};
pub use resolver::{DescriptionSource, PathResolver, ResolvedArchive};
pub use source::{MetadataSource, is_valid_url};

pub use datadok_model::{ArchiveError, ArchiveMetadata, Result};
