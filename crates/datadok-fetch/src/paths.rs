//! Archive path candidates.
//!
//! Archive files are referred to in several equivalent ways: through a
//! `$STAMME` shortcut (`$UTD/nudb/arkiv/g2022`) or the mount point it expands
//! to (`/ssb/stamme01/utd/nudb/arkiv/g2022`), with or without the PII variant
//! of the stamme, and with or without a `.dat`/`.txt` extension. Datadok may
//! know the file under any of these spellings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use datadok_model::{ArchiveError, Result};

/// Extensions stripped from an archive path before generating candidates.
const KNOWN_EXTENSIONS: [&str; 2] = [".dat", ".txt"];

/// `$NAME` shortcuts exported by the shared shell profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StammeVariables {
    vars: BTreeMap<String, String>,
}

impl StammeVariables {
    /// Loads `export NAME=/path` lines from a profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ArchiveError::StammeFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    /// Loads the profile, falling back to no shortcuts when it cannot be read.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(vars) => vars,
            Err(error) => {
                tracing::warn!(%error, "Stamme shortcuts unavailable, using paths as given");
                Self::default()
            }
        }
    }

    /// Parses profile text. A line with more than one `=` is rejected.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut vars = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            let Some(assignment) = line.strip_prefix("export ") else {
                continue;
            };
            if !assignment.contains('=') {
                continue;
            }
            let parts: Vec<&str> = assignment.split('=').collect();
            if parts.len() != 2 {
                return Err(ArchiveError::StammeFile {
                    path: path.to_path_buf(),
                    reason: format!("too many '=' in line: {line}"),
                });
            }
            vars.insert(parts[0].trim().to_string(), parts[1].trim().to_string());
        }
        Ok(Self { vars })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Finds the single shortcut expanding to `value`.
    ///
    /// Returns `None` when no shortcut or more than one shortcut matches.
    pub fn key_for_value(&self, value: &str) -> Option<&str> {
        let mut matches = self
            .vars
            .iter()
            .filter(|(_, v)| v.as_str() == value)
            .map(|(k, _)| k.as_str());
        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::warn!(value, "Several stamme shortcuts share a path");
            return None;
        }
        Some(first)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A candidate spelling of an archive path: stem plus extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub stem: String,
    pub extension: String,
}

impl Candidate {
    pub fn path(&self) -> String {
        format!("{}{}", self.stem, self.extension)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.path())
    }
}

/// Generates candidate spellings of an archive path.
///
/// Order: the path as given, its `$STAMME` translation, then the PII twins of
/// both, each crossed with every extension.
pub fn path_combinations(
    path: &str,
    stamme: &StammeVariables,
    extensions: &[String],
) -> Vec<Candidate> {
    let mut path = path.to_string();
    for ext in KNOWN_EXTENSIONS {
        if let Some(stripped) = path.strip_suffix(ext) {
            path = stripped.to_string();
            break;
        }
    }

    let mut paths = vec![path.clone()];
    if let Some(translated) = translate_stamme(&path, stamme) {
        paths.push(translated);
    }

    let twins: Vec<String> = paths.iter().filter_map(|p| pii_twin(p)).collect();
    paths.extend(twins);
    paths.dedup();

    paths
        .iter()
        .flat_map(|stem| {
            extensions.iter().map(move |ext| Candidate {
                stem: stem.clone(),
                extension: ext.clone(),
            })
        })
        .collect()
}

/// Translates between `$NAME/rest` and the expanded mount path.
fn translate_stamme(path: &str, stamme: &StammeVariables) -> Option<String> {
    if let Some(dollar_path) = path.strip_prefix('$') {
        let (head, rest) = dollar_path.split_once('/').unwrap_or((dollar_path, ""));
        let name = head.replace("_PII", "").to_uppercase();
        let expanded = stamme.get(&name)?;
        return Some(if rest.is_empty() {
            expanded.to_string()
        } else {
            format!("{}/{rest}", expanded.trim_end_matches('/'))
        });
    }

    let absolute = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let parts: Vec<&str> = absolute.split('/').filter(|s| !s.is_empty()).collect();
    if parts.len() < 3 {
        return None;
    }
    let mount = format!("/{}", parts[..3].join("/"));
    let Some(name) = stamme.key_for_value(&mount) else {
        tracing::debug!(%mount, "No stamme shortcut for mount point");
        return None;
    };
    Some(absolute.replacen(&mount, &format!("${name}"), 1))
}

/// Toggles the PII variant: `$UTD` <-> `$UTD_PII`, `/ssb/stamme01/utd` <-> `.../utd_pii`.
fn pii_twin(path: &str) -> Option<String> {
    let mut parts: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if path.starts_with('$') {
        let head = parts.first_mut()?;
        *head = match head.strip_suffix("_PII") {
            Some(stripped) => stripped.to_string(),
            None => format!("{head}_PII"),
        };
        return Some(parts.join("/"));
    }

    let stamme = parts.get_mut(2)?;
    *stamme = match stamme.strip_suffix("_pii") {
        Some(stripped) => stripped.to_string(),
        None => format!("{stamme}_pii"),
    };
    Some(format!("/{}", parts.join("/")))
}

/// Moves every leading `gYYYY` token of the file name one year back.
///
/// `.../arkiv/g2013g2023` becomes `.../arkiv/g2012g2022`. Returns `None` when
/// the file name does not start with a year token.
pub fn previous_year_path(path: &str) -> Option<String> {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };

    let bytes = name.as_bytes();
    let mut offset = 0;
    let mut ranges = Vec::new();
    while bytes.len() >= offset + 5
        && bytes[offset].eq_ignore_ascii_case(&b'g')
        && bytes[offset + 1..offset + 5].iter().all(u8::is_ascii_digit)
    {
        ranges.push(offset + 1..offset + 5);
        offset += 5;
    }
    if ranges.is_empty() {
        return None;
    }

    let mut shifted = name.to_string();
    for range in ranges {
        let year: u32 = name[range.clone()].parse().ok()?;
        let previous = year.checked_sub(1)?;
        shifted.replace_range(range, &format!("{previous:04}"));
    }

    Some(match dir {
        Some(dir) => format!("{dir}/{shifted}"),
        None => shifted,
    })
}
