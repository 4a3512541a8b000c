//! Text content digesting.
//!
//! Deterministic by construction: surrounding whitespace is trimmed before
//! hashing, so formatting-only differences at the edges do not change the
//! digest.

use std::path::Path;

use ring::digest;

use crate::error::Result;
use crate::types::TextDigestData;

/// Text digester: cryptographic content hash plus basic statistics.
pub struct TextDigest;

impl TextDigest {
    /// Digest a text string.
    pub fn digest(text: &str) -> TextDigestData {
        let trimmed = text.trim();
        let hash = digest::digest(&digest::SHA256, trimmed.as_bytes());

        TextDigestData {
            text_hash: hex::encode(hash.as_ref()),
            text_length: trimmed.chars().count(),
            word_count: trimmed.split_whitespace().count(),
            line_count: if trimmed.is_empty() {
                0
            } else {
                trimmed.lines().count()
            },
        }
    }

    /// Digest a text file; invalid UTF-8 sequences are replaced rather than
    /// rejected.
    pub fn digest_file(path: impl AsRef<Path>) -> Result<TextDigestData> {
        let bytes = std::fs::read(path.as_ref())?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::digest(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let data = TextDigest::digest("Hello, World!");
        assert_eq!(
            data.text_hash,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(data.text_length, 13);
        assert_eq!(data.word_count, 2);
        assert_eq!(data.line_count, 1);
    }

    #[test]
    fn test_whitespace_does_not_affect_hash() {
        let plain = TextDigest::digest("Hello, World!");
        let padded = TextDigest::digest("  \n\tHello, World!  \n");
        assert_eq!(plain.text_hash, padded.text_hash);
        assert_eq!(plain.text_length, padded.text_length);
    }

    #[test]
    fn test_empty_string_is_well_defined() {
        let data = TextDigest::digest("");
        // SHA-256 of the empty byte string.
        assert_eq!(
            data.text_hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(data.text_length, 0);
        assert_eq!(data.word_count, 0);
        assert_eq!(data.line_count, 0);
    }

    #[test]
    fn test_pure_function() {
        let text = "same input, same digest";
        assert_eq!(TextDigest::digest(text), TextDigest::digest(text));
    }

    #[test]
    fn test_multiline_statistics() {
        let data = TextDigest::digest("one two\nthree four\nfive");
        assert_eq!(data.line_count, 3);
        assert_eq!(data.word_count, 5);
    }
}
