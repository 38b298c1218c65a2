//! Text encoding selection for archive files.
//!
//! Archive files predate UTF-8 at SSB and are mostly latin1. The decoder
//! splits records on `\n` bytes, so only ASCII-compatible encodings work.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use datadok_model::{ArchiveError, Result};

/// How to pick the encoding of a data file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncodingChoice {
    /// Detect from a byte-order mark or the leading bytes.
    ///
    /// Without a BOM, UTF-8 is only picked when the sample holds non-ASCII
    /// bytes that form valid UTF-8; otherwise windows-1252 is used.
    #[default]
    Auto,
    /// Use this encoding.
    Explicit(&'static Encoding),
}

impl EncodingChoice {
    /// Looks up a WHATWG encoding label such as `latin1` or `utf-8`.
    pub fn from_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Self::Explicit)
    }
}

/// Encoding picked for a file plus the length of its byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    pub bom_length: usize,
}

/// Picks the encoding for a file given its leading bytes.
pub fn resolve_encoding(
    choice: EncodingChoice,
    sample: &[u8],
    path: &Path,
) -> Result<DetectedEncoding> {
    let bom = Encoding::for_bom(sample);
    let detected = match choice {
        EncodingChoice::Explicit(encoding) => DetectedEncoding {
            encoding,
            bom_length: match bom {
                Some((bom_encoding, length)) if bom_encoding == encoding => length,
                _ => 0,
            },
        },
        EncodingChoice::Auto => match bom {
            Some((encoding, bom_length)) => DetectedEncoding {
                encoding,
                bom_length,
            },
            None if !sample.is_ascii() && looks_like_utf8(sample) => DetectedEncoding {
                encoding: UTF_8,
                bom_length: 0,
            },
            None => DetectedEncoding {
                encoding: WINDOWS_1252,
                bom_length: 0,
            },
        },
    };

    // UTF-16 and friends cannot be split on newline bytes
    if !detected.encoding.is_ascii_compatible() {
        return Err(ArchiveError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: detected.encoding.name().to_string(),
        });
    }

    tracing::debug!(
        path = %path.display(),
        encoding = detected.encoding.name(),
        bom = detected.bom_length > 0,
        "Selected archive encoding"
    );
    Ok(detected)
}

/// True when the sample is valid UTF-8, allowing a sequence cut at the end.
fn looks_like_utf8(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto(sample: &[u8]) -> Result<DetectedEncoding> {
        resolve_encoding(EncodingChoice::Auto, sample, Path::new("test.dat"))
    }

    #[test]
    fn test_ascii_sample_is_latin1() {
        assert_eq!(auto(b"00042John").unwrap().encoding, WINDOWS_1252);
        assert_eq!(auto(b"").unwrap().encoding, WINDOWS_1252);
    }

    #[test]
    fn test_non_ascii_utf8_sample() {
        assert_eq!(auto("00042Bjørn".as_bytes()).unwrap().encoding, UTF_8);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Bø" in latin1
        assert_eq!(auto(&[b'B', 0xF8]).unwrap().encoding, WINDOWS_1252);
    }

    #[test]
    fn test_truncated_utf8_sequence() {
        // "ø" is C3 B8; the sample ends after the first byte
        assert_eq!(auto(&[b'a', 0xC3]).unwrap().encoding, UTF_8);
    }

    #[test]
    fn test_utf8_bom() {
        let detected = auto(&[0xEF, 0xBB, 0xBF, b'a']).unwrap();
        assert_eq!(detected.encoding, UTF_8);
        assert_eq!(detected.bom_length, 3);
    }

    #[test]
    fn test_utf16_rejected() {
        let err = auto(&[0xFF, 0xFE, b'a', 0]).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn test_explicit_label() {
        let choice = EncodingChoice::from_label("latin1").unwrap();
        let detected = resolve_encoding(choice, b"abc", Path::new("x")).unwrap();
        assert_eq!(detected.encoding, WINDOWS_1252);
        assert!(EncodingChoice::from_label("klingon").is_none());
    }
}
