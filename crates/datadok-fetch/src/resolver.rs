//! Resolves a user-supplied archive path to a Datadok metapath and a data file.

use std::path::PathBuf;

use datadok_model::{ArchiveError, ArchiveMetadata, Result};

use crate::client::DatadokClient;
use crate::config::DatadokConfig;
use crate::paths::{Candidate, StammeVariables, path_combinations, previous_year_path};

/// Something that can look up the Datadok description of a path.
pub trait DescriptionSource {
    /// `Ok(None)` when the path is not described; `Err` when the lookup itself failed.
    fn describe(&self, path: &str) -> Result<Option<ArchiveMetadata>>;
}

impl DescriptionSource for DatadokClient {
    fn describe(&self, path: &str) -> Result<Option<ArchiveMetadata>> {
        DatadokClient::describe(self, path)
    }
}

/// Outcome of path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArchive {
    /// Path Datadok knows the description under.
    pub metapath: String,
    /// The description found for `metapath`.
    pub metadata: ArchiveMetadata,
    /// Data file found on disk.
    pub data_file: PathBuf,
}

/// Finds the description and data file for an archive path.
#[derive(Debug)]
pub struct PathResolver<'a, P: DescriptionSource> {
    source: &'a P,
    stamme: StammeVariables,
    extensions: Vec<String>,
    years_back: u32,
}

impl<'a, P: DescriptionSource> PathResolver<'a, P> {
    /// Creates a resolver, loading stamme shortcuts from the configured file.
    pub fn new(source: &'a P, config: &DatadokConfig) -> Self {
        Self {
            source,
            stamme: StammeVariables::load_or_empty(&config.stamme_file),
            extensions: config.file_extensions.clone(),
            years_back: config.years_back,
        }
    }

    #[must_use]
    pub fn with_stamme(mut self, stamme: StammeVariables) -> Self {
        self.stamme = stamme;
        self
    }

    pub fn candidates(&self, path: &str) -> Vec<Candidate> {
        path_combinations(path, &self.stamme, &self.extensions)
    }

    /// Resolves both the metapath and the data file.
    pub fn resolve(&self, path: &str) -> Result<ResolvedArchive> {
        let (metapath, metadata) = self.find_metapath(path)?;
        let data_file = self.find_data_file(path)?;
        tracing::info!(%metapath, data_file = %data_file.display(), "Resolved archive path");
        Ok(ResolvedArchive {
            metapath,
            metadata,
            data_file,
        })
    }

    /// Finds the first candidate Datadok describes, with its description.
    ///
    /// Yearly archives often share the description of an earlier year, so when
    /// no candidate matches the year tokens of the file name are stepped back
    /// one year at a time. A failing lookup stops the search.
    pub fn find_metapath(&self, path: &str) -> Result<(String, ArchiveMetadata)> {
        let mut tried = 0;
        let mut current = Some(path.to_string());

        for step in 0..=self.years_back {
            let Some(attempt) = current else {
                break;
            };
            for candidate in self.candidates(&attempt) {
                tried += 1;
                let candidate = candidate.path();
                if let Some(metadata) = self.source.describe(&candidate)? {
                    if step > 0 {
                        tracing::info!(
                            path,
                            metapath = %candidate,
                            years_back = step,
                            "Using description from an earlier year"
                        );
                    }
                    return Ok((candidate, metadata));
                }
            }
            current = previous_year_path(&attempt);
        }

        Err(ArchiveError::ArchivePathNotFound {
            path: path.to_string(),
            tried,
        })
    }

    /// Finds the first candidate that exists as a file on disk.
    pub fn find_data_file(&self, path: &str) -> Result<PathBuf> {
        self.candidates(path)
            .iter()
            .map(Candidate::to_path_buf)
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ArchiveError::DataFileNotFound {
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;

    use super::*;

    struct FakeService {
        known: Vec<String>,
        asked: RefCell<Vec<String>>,
    }

    impl FakeService {
        fn new(known: &[&str]) -> Self {
            Self {
                known: known.iter().map(|s| (*s).to_string()).collect(),
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl DescriptionSource for FakeService {
        fn describe(&self, path: &str) -> Result<Option<ArchiveMetadata>> {
            self.asked.borrow_mut().push(path.to_string());
            if path.contains("broken") {
                return Err(ArchiveError::metadata_unavailable(path, "connection refused"));
            }
            Ok(self
                .known
                .iter()
                .any(|k| k == path)
                .then(ArchiveMetadata::default))
        }
    }

    fn resolver(source: &FakeService) -> PathResolver<'_, FakeService> {
        let config = DatadokConfig::default().with_stamme_file("/nonexistent/stamme");
        PathResolver::new(source, &config).with_stamme(StammeVariables::from_pairs([(
            "UTD",
            "/ssb/stamme01/utd",
        )]))
    }

    #[test]
    fn test_finds_expanded_metapath() {
        let source = FakeService::new(&["/ssb/stamme01/utd/arkiv/g2020.dat"]);
        let (metapath, _) = resolver(&source).find_metapath("$UTD/arkiv/g2020").unwrap();
        assert_eq!(metapath, "/ssb/stamme01/utd/arkiv/g2020.dat");
    }

    #[test]
    fn test_goes_back_in_time() {
        let source = FakeService::new(&["$UTD/arkiv/g2017g2018"]);
        let (metapath, _) = resolver(&source)
            .find_metapath("$UTD/arkiv/g2020g2021")
            .unwrap();
        assert_eq!(metapath, "$UTD/arkiv/g2017g2018");
    }

    #[test]
    fn test_gives_up_after_years_back() {
        let source = FakeService::new(&[]);
        let resolver = resolver(&source);
        let err = resolver.find_metapath("$UTD/arkiv/g2020").unwrap_err();
        let ArchiveError::ArchivePathNotFound { tried, .. } = err else {
            panic!("expected ArchivePathNotFound, got {err:?}");
        };
        // 4 spellings x 3 extensions, for the year itself and 20 earlier years
        assert_eq!(tried, 12 * 21);
        assert_eq!(source.asked.borrow().len(), tried);
    }

    #[test]
    fn test_failed_lookup_stops_the_search() {
        let source = FakeService::new(&["/tmp/broken/g2019"]);
        let err = resolver(&source).find_metapath("/tmp/broken/g2020").unwrap_err();
        assert!(matches!(err, ArchiveError::MetadataUnavailable { .. }));
        assert_eq!(source.asked.borrow().len(), 1);
    }

    #[test]
    fn test_no_year_token_tries_once() {
        let source = FakeService::new(&[]);
        let err = resolver(&source).find_metapath("/tmp/file").unwrap_err();
        assert!(matches!(err, ArchiveError::ArchivePathNotFound { tried: 3, .. }));
    }

    #[test]
    fn test_finds_data_file_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("g2020");
        fs::write(dir.path().join("g2020.txt"), "00042John      01\n").unwrap();

        let source = FakeService::new(&[]);
        let found = resolver(&source)
            .find_data_file(stem.to_str().unwrap())
            .unwrap();
        assert_eq!(found, dir.path().join("g2020.txt"));
    }

    #[test]
    fn test_missing_data_file() {
        let source = FakeService::new(&[]);
        let err = resolver(&source)
            .find_data_file("/nonexistent/g2020")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::DataFileNotFound { .. }));
    }
}
