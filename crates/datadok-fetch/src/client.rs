//! Blocking HTTP client for the Datadok file-description endpoint.

use std::fs;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use datadok_model::{ArchiveError, ArchiveMetadata, Result};

use crate::config::DatadokConfig;
use crate::parse::parse_metadata;
use crate::source::MetadataSource;

/// Body Datadok returns (with status 200) for paths it does not know.
const NULL_RESPONSE_MARKER: &str = "Value cannot be null.";

/// User agent string for metadata requests.
const USER_AGENT_VALUE: &str = concat!("datadok-archive/", env!("CARGO_PKG_VERSION"));

/// Client for fetching archive descriptions.
///
/// Every fetch is a single request; failures surface immediately.
#[derive(Debug, Clone)]
pub struct DatadokClient {
    client: Client,
    config: DatadokConfig,
}

impl DatadokClient {
    /// Creates a client from configuration.
    pub fn new(config: DatadokConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/xml, application/json;q=0.9, */*;q=0.1"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                ArchiveError::metadata_unavailable(
                    &config.endpoint,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DatadokConfig {
        &self.config
    }

    /// Builds the description URL for an archive path.
    pub fn url_for(&self, archive_path: &str) -> Result<Url> {
        Url::parse_with_params(&self.config.endpoint, &[("path", archive_path)]).map_err(|e| {
            ArchiveError::metadata_unavailable(
                &self.config.endpoint,
                format!("invalid endpoint URL: {e}"),
            )
        })
    }

    /// Fetches and parses the description of an archive path.
    pub fn fetch(&self, archive_path: &str) -> Result<ArchiveMetadata> {
        let url = self.url_for(archive_path)?;
        let body = self.get_text(&url)?;
        parse_metadata(&body, url.as_str())
    }

    /// Fetches and parses a description from a URL or a local file.
    pub fn fetch_source(&self, source: &MetadataSource) -> Result<ArchiveMetadata> {
        match source {
            MetadataSource::Url(url) => {
                let url = Url::parse(url).map_err(|e| {
                    ArchiveError::metadata_unavailable(url.as_str(), format!("invalid URL: {e}"))
                })?;
                let body = self.get_text(&url)?;
                parse_metadata(&body, url.as_str())
            }
            MetadataSource::File(path) => {
                let body = fs::read_to_string(path).map_err(|e| {
                    ArchiveError::metadata_unavailable(
                        path.display().to_string(),
                        format!("failed to read file: {e}"),
                    )
                })?;
                parse_metadata(&body, &path.display().to_string())
            }
        }
    }

    /// Fetches the description of an archive path if Datadok has one.
    ///
    /// A non-success status or the service's null marker means the path is
    /// not described and gives `Ok(None)`. Transport failures and unparsable
    /// bodies are errors.
    pub fn describe(&self, archive_path: &str) -> Result<Option<ArchiveMetadata>> {
        let url = self.url_for(archive_path)?;
        match self.request(&url)? {
            Reply::Body(body) => parse_metadata(&body, url.as_str()).map(Some),
            Reply::NotDescribed(reason) => {
                tracing::trace!(path = %archive_path, %reason, "No description");
                Ok(None)
            }
        }
    }

    /// Performs one GET and returns the body of a successful, non-null response.
    fn get_text(&self, url: &Url) -> Result<String> {
        match self.request(url)? {
            Reply::Body(body) => Ok(body),
            Reply::NotDescribed(reason) => {
                Err(ArchiveError::metadata_unavailable(url.as_str(), reason))
            }
        }
    }

    fn request(&self, url: &Url) -> Result<Reply> {
        tracing::debug!(url = %url, "Fetching archive description");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| ArchiveError::metadata_unavailable(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Reply::NotDescribed(format!(
                "service returned status {status}"
            )));
        }

        let body = response
            .text()
            .map_err(|e| ArchiveError::metadata_unavailable(url.as_str(), e.to_string()))?;

        if body.contains(NULL_RESPONSE_MARKER) {
            return Ok(Reply::NotDescribed(
                "service has no description for this path".to_string(),
            ));
        }

        Ok(Reply::Body(body))
    }
}

/// What the service answered for one request.
enum Reply {
    Body(String),
    /// Status or body saying the path is unknown.
    NotDescribed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_encodes_path() {
        let client = DatadokClient::new(
            DatadokConfig::default().with_endpoint("http://localhost/GetFileDescriptionByPath"),
        )
        .unwrap();
        let url = client.url_for("$UTD/nudb/arkiv/g2022").unwrap();
        assert_eq!(url.path(), "/GetFileDescriptionByPath");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "path");
        assert_eq!(value, "$UTD/nudb/arkiv/g2022");
    }

    #[test]
    fn test_invalid_endpoint() {
        let client =
            DatadokClient::new(DatadokConfig::default().with_endpoint("not a url")).unwrap();
        let err = client.url_for("x").unwrap_err();
        assert!(matches!(err, ArchiveError::MetadataUnavailable { .. }));
        assert!(client.describe("x").is_err());
    }

    #[test]
    fn test_fetch_source_missing_file() {
        let client = DatadokClient::new(DatadokConfig::default()).unwrap();
        let source = MetadataSource::File("/nonexistent/description.xml".into());
        let err = client.fetch_source(&source).unwrap_err();
        assert!(matches!(err, ArchiveError::MetadataUnavailable { .. }));
    }
}
