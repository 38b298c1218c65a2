//! Library side of the `datadok` command: logging setup and summary tables.

pub mod logging;
pub mod summary;
