//! CLI argument definitions for the archive reader.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "datadok",
    version,
    about = "Read a Datadok-described fixed-width archive file",
    long_about = "Read a fixed-width archive file using its Datadok file description.\n\n\
                  PATH may use $STAMME shortcuts, omit the .dat/.txt extension, or name\n\
                  a yearly file whose description was registered for an earlier year."
)]
pub struct Cli {
    /// Archive path, e.g. `$UTD/nudb/arkiv/grunnskole/g2022`.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Read the description from another archive path, a URL or a local XML/JSON file.
    #[arg(long = "metapath", value_name = "METAPATH")]
    pub metapath: Option<String>,

    /// Encoding label of the data file (e.g. latin1, utf-8). Detected when omitted.
    #[arg(long = "encoding", value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Number of labelled rows to print.
    #[arg(long = "head", value_name = "N", default_value_t = 10)]
    pub head: usize,

    /// Treat declared start positions as zero-based.
    #[arg(long = "zero-based")]
    pub zero_based: bool,

    /// Decode on the current thread only.
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
