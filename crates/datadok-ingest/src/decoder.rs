//! Fixed-width decoding into a Polars DataFrame.
//!
//! The file is read line by line as raw bytes, since field offsets are byte
//! offsets in the archive's own encoding. Lines are gathered into bounded
//! batches; each batch is decoded (in parallel when enabled) and appended to
//! per-column buffers in line order.
//!
//! # Example
//!
//! ```ignore
//! use datadok_ingest::{DecodeOptions, build_layout, decode_file, LayoutOptions};
//!
//! let layout = build_layout(&metadata, &LayoutOptions::default())?;
//! let decoded = decode_file(&path, &layout, &DecodeOptions::default())?;
//! println!("{} rows in {}", decoded.rows, decoded.encoding.name());
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Datelike;
use encoding_rs::Encoding;
use polars::prelude::*;
use rayon::prelude::*;

use datadok_model::{ArchiveError, ColumnType, Result};

use crate::encoding::{EncodingChoice, resolve_encoding};
use crate::layout::ColumnLayout;
use crate::value::{Value, parse_value};

/// Default number of lines decoded per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

/// Value that marks a missing field in SSB archives.
pub const DEFAULT_MISSING_MARKER: &str = ".";

/// Read buffer size; the first fill doubles as the encoding sample.
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Options for decoding a data file.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub encoding: EncodingChoice,
    /// Trimmed values treated as null.
    pub missing_markers: Vec<String>,
    /// Lines per batch.
    /// Defaults to 50000.
    pub batch_size: usize,
    /// Decode each batch on the rayon pool.
    pub parallel: bool,
    /// Shrink integer columns to the smallest type holding their range.
    pub downcast_integers: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            encoding: EncodingChoice::Auto,
            missing_markers: vec![DEFAULT_MISSING_MARKER.to_string()],
            batch_size: DEFAULT_BATCH_SIZE,
            parallel: true,
            downcast_integers: true,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn with_encoding(mut self, encoding: EncodingChoice) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_missing_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn with_downcast_integers(mut self, enabled: bool) -> Self {
        self.downcast_integers = enabled;
        self
    }
}

/// A decoded data file.
#[derive(Debug, Clone)]
pub struct DecodedArchive {
    /// One column per layout column, one row per input line.
    pub frame: DataFrame,
    /// Encoding the file was decoded with.
    pub encoding: &'static Encoding,
    pub rows: usize,
}

/// Decodes single records against a layout.
#[derive(Debug, Clone, Copy)]
pub struct LineDecoder<'a> {
    layout: &'a ColumnLayout,
    encoding: &'static Encoding,
    missing_markers: &'a [String],
}

impl<'a> LineDecoder<'a> {
    pub fn new(
        layout: &'a ColumnLayout,
        encoding: &'static Encoding,
        missing_markers: &'a [String],
    ) -> Self {
        Self {
            layout,
            encoding,
            missing_markers,
        }
    }

    /// Decodes one record (without its line terminator) into typed values.
    ///
    /// `line_number` is 1-based and only used for error context. Bytes past
    /// the record length are ignored. Bytes the encoding cannot decode are an
    /// error, never replaced.
    pub fn decode_line(&self, line: &[u8], line_number: usize) -> Result<Vec<Value>> {
        let expected = self.layout.record_length();
        if line.len() < expected {
            return Err(ArchiveError::RecordTooShort {
                line: line_number,
                expected,
                actual: line.len(),
            });
        }

        self.layout
            .iter()
            .map(|column| {
                let (text, had_errors) =
                    self.encoding.decode_without_bom_handling(&line[column.range()]);
                if had_errors {
                    return Err(ArchiveError::MalformedText {
                        field: column.name.clone(),
                        line: line_number,
                        encoding: self.encoding.name().to_string(),
                    });
                }
                let text = text.trim();
                if text.is_empty() || self.is_missing(text) {
                    return Ok(Value::Null);
                }
                parse_value(column, text, line_number)
            })
            .collect()
    }

    fn is_missing(&self, text: &str) -> bool {
        self.missing_markers.iter().any(|marker| marker == text)
    }
}

/// Decodes a data file on disk.
pub fn decode_file(
    path: &Path,
    layout: &ColumnLayout,
    options: &DecodeOptions,
) -> Result<DecodedArchive> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArchiveError::DataFileNotFound {
                path: path.display().to_string(),
            }
        } else {
            ArchiveError::io(path, e)
        }
    })?;
    decode_reader(
        BufReader::with_capacity(READ_BUFFER_BYTES, file),
        path,
        layout,
        options,
    )
}

/// Decodes newline-delimited records from any buffered reader.
///
/// `source` names the input in errors and logs.
pub fn decode_reader<R: BufRead>(
    mut reader: R,
    source: &Path,
    layout: &ColumnLayout,
    options: &DecodeOptions,
) -> Result<DecodedArchive> {
    let sample = reader.fill_buf().map_err(|e| ArchiveError::io(source, e))?;
    let detected = resolve_encoding(options.encoding, sample, source)?;
    reader.consume(detected.bom_length);

    let decoder = LineDecoder::new(layout, detected.encoding, &options.missing_markers);
    let batch_size = options.batch_size.max(1);
    let mut table = TableBuilder::new(layout);
    let mut batch: Vec<Vec<u8>> = Vec::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE));
    let mut next_line = 1;

    loop {
        let mut line = Vec::new();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| ArchiveError::io(source, e))?;
        if read == 0 {
            break;
        }
        strip_line_ending(&mut line);
        batch.push(line);

        if batch.len() == batch_size {
            decode_batch(&decoder, &batch, next_line, options.parallel, &mut table)?;
            next_line += batch.len();
            batch.clear();
        }
    }
    if !batch.is_empty() {
        decode_batch(&decoder, &batch, next_line, options.parallel, &mut table)?;
        next_line += batch.len();
    }

    let rows = next_line - 1;
    let frame = table.finish(layout, options.downcast_integers)?;
    tracing::info!(
        source = %source.display(),
        rows,
        columns = frame.width(),
        encoding = detected.encoding.name(),
        "Decoded archive file"
    );

    Ok(DecodedArchive {
        frame,
        encoding: detected.encoding,
        rows,
    })
}

fn strip_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

/// Decodes one batch and appends it to the table in line order.
///
/// When several lines fail, the error of the earliest line is returned.
fn decode_batch(
    decoder: &LineDecoder<'_>,
    batch: &[Vec<u8>],
    first_line: usize,
    parallel: bool,
    table: &mut TableBuilder,
) -> Result<()> {
    let decode = |(offset, line): (usize, &Vec<u8>)| decoder.decode_line(line, first_line + offset);
    let rows: Vec<Result<Vec<Value>>> = if parallel {
        batch.par_iter().enumerate().map(decode).collect()
    } else {
        batch.iter().enumerate().map(decode).collect()
    };

    for row in rows {
        table.push_row(row?);
    }
    tracing::debug!(first_line, lines = batch.len(), "Decoded batch");
    Ok(())
}

/// Typed buffer for one output column.
enum ColumnBuffer {
    Integer(Vec<Option<i64>>),
    Decimal(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    /// Days since the Unix epoch.
    Date(Vec<Option<i32>>),
}

impl ColumnBuffer {
    fn for_type(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Integer => Self::Integer(Vec::new()),
            ColumnType::Decimal { .. } => Self::Decimal(Vec::new()),
            ColumnType::Character => Self::Text(Vec::new()),
            ColumnType::Date { .. } => Self::Date(Vec::new()),
        }
    }

    fn push(&mut self, value: Value) {
        match self {
            Self::Integer(values) => values.push(match value {
                Value::Integer(v) => Some(v),
                _ => None,
            }),
            Self::Decimal(values) => values.push(match value {
                Value::Decimal(v) => Some(v),
                _ => None,
            }),
            Self::Text(values) => values.push(match value {
                Value::Text(v) => Some(v),
                _ => None,
            }),
            Self::Date(values) => values.push(match value {
                Value::Date(v) => Some(v.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                _ => None,
            }),
        }
    }

    fn into_column(self, name: &str, downcast_integers: bool) -> Result<Column> {
        let column = match self {
            Self::Integer(values) => {
                let target = if downcast_integers {
                    smallest_integer_type(&values)
                } else {
                    DataType::Int64
                };
                let column = Column::new(name.into(), values);
                if target == DataType::Int64 {
                    column
                } else {
                    column.cast(&target)?
                }
            }
            Self::Decimal(values) => Column::new(name.into(), values),
            Self::Text(values) => Column::new(name.into(), values),
            Self::Date(days) => Column::new(name.into(), days).cast(&DataType::Date)?,
        };
        Ok(column)
    }
}

/// Smallest signed integer type holding every value; all-null columns stay Int64.
fn smallest_integer_type(values: &[Option<i64>]) -> DataType {
    let mut present = values.iter().flatten().copied().peekable();
    if present.peek().is_none() {
        return DataType::Int64;
    }
    let (min, max) = present.fold((0i64, 0i64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if i8::try_from(min).is_ok() && i8::try_from(max).is_ok() {
        DataType::Int8
    } else if i16::try_from(min).is_ok() && i16::try_from(max).is_ok() {
        DataType::Int16
    } else if i32::try_from(min).is_ok() && i32::try_from(max).is_ok() {
        DataType::Int32
    } else {
        DataType::Int64
    }
}

struct TableBuilder {
    buffers: Vec<ColumnBuffer>,
}

impl TableBuilder {
    fn new(layout: &ColumnLayout) -> Self {
        Self {
            buffers: layout
                .iter()
                .map(|column| ColumnBuffer::for_type(&column.column_type))
                .collect(),
        }
    }

    fn push_row(&mut self, row: Vec<Value>) {
        for (buffer, value) in self.buffers.iter_mut().zip(row) {
            buffer.push(value);
        }
    }

    fn finish(self, layout: &ColumnLayout, downcast_integers: bool) -> Result<DataFrame> {
        let columns = self
            .buffers
            .into_iter()
            .zip(layout.iter())
            .map(|(buffer, spec)| buffer.into_column(&spec.name, downcast_integers))
            .collect::<Result<Vec<_>>>()?;
        Ok(DataFrame::new(columns)?)
    }
}
