//! Fixed-width archive ingestion.
//!
//! [`build_layout`] turns an [`ArchiveMetadata`](datadok_model::ArchiveMetadata)
//! into a validated [`ColumnLayout`]; [`decode_file`] streams a data file
//! through that layout into a Polars DataFrame. [`encode_row`] goes the other
//! way for a single row.

pub mod decoder;
pub mod encode;
pub mod encoding;
pub mod layout;
pub mod value;

pub use decoder::{
    DEFAULT_BATCH_SIZE, DEFAULT_MISSING_MARKER, DecodeOptions, DecodedArchive, LineDecoder,
    decode_file, decode_reader,
};
pub use encode::encode_row;
pub use encoding::{DetectedEncoding, EncodingChoice, resolve_encoding};
pub use layout::{
    ColumnLayout, ColumnSpec, LayoutOptions, PositionBase, build_layout, resolve_column_type,
};
pub use value::Value;
