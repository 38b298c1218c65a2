//! Where a metadata document comes from.

use std::fmt;
use std::path::PathBuf;

use reqwest::Url;

/// A metadata document location: a URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    Url(String),
    File(PathBuf),
}

impl MetadataSource {
    /// Classifies a string as a URL when it has both a scheme and a host.
    pub fn parse(location: &str) -> Self {
        if is_valid_url(location) {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Returns true if `candidate` parses as a URL with a scheme and a host.
pub fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}
