//! Configuration for talking to Datadok.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Datadok endpoint returning a file description for an archive path.
pub const DEFAULT_ENDPOINT: &str =
    "http://ws.ssb.no/DatadokService/DatadokService.asmx/GetFileDescriptionByPath";

/// Shared shell profile exporting the `$STAMME` path shortcuts.
pub const DEFAULT_STAMME_FILE: &str = "/etc/profile.d/stamme_variabel";

/// Environment variable overriding the endpoint.
const ENDPOINT_ENV: &str = "DATADOK_ENDPOINT";

/// Environment variable overriding the stamme file.
const STAMME_FILE_ENV: &str = "DATADOK_STAMME_FILE";

/// Settings for the metadata fetcher and path resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatadokConfig {
    /// Base URL of the file-description endpoint.
    pub endpoint: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Path of the stamme shortcut file.
    pub stamme_file: PathBuf,
    /// How many years to look back for yearly archives without their own description.
    pub years_back: u32,
    /// File extensions tried for every candidate path.
    pub file_extensions: Vec<String>,
}

impl Default for DatadokConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            stamme_file: PathBuf::from(DEFAULT_STAMME_FILE),
            years_back: 20,
            file_extensions: vec![String::new(), ".dat".to_string(), ".txt".to_string()],
        }
    }
}

impl DatadokConfig {
    /// Defaults with `DATADOK_ENDPOINT` and `DATADOK_STAMME_FILE` applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV)
            && !endpoint.trim().is_empty()
        {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Ok(path) = std::env::var(STAMME_FILE_ENV)
            && !path.trim().is_empty()
        {
            config.stamme_file = PathBuf::from(path.trim());
        }
        config
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_stamme_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stamme_file = path.into();
        self
    }

    #[must_use]
    pub fn with_years_back(mut self, years: u32) -> Self {
        self.years_back = years;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
