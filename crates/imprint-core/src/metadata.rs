//! Optional metadata-extraction collaborator.
//!
//! Metadata (EXIF, codec details, page counts) is an enrichment merged into
//! the embedding description; it is never required for hashing correctness.

use std::path::Path;

use async_trait::async_trait;

use crate::record::FingerprintKind;

/// Metadata map attached to the embedding description.
pub type MetadataMap = serde_json::Map<String, serde_json::Value>;

/// Optional metadata extractor collaborator.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extract metadata for the asset at `path`, or `None` when nothing is
    /// available. Failures are treated as "no metadata".
    async fn extract(&self, kind: FingerprintKind, path: &Path) -> Option<MetadataMap>;
}

/// The "not configured" extractor.
pub struct NoopMetadata;

#[async_trait]
impl MetadataExtractor for NoopMetadata {
    async fn extract(&self, _kind: FingerprintKind, _path: &Path) -> Option<MetadataMap> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_returns_none() {
        let extracted = NoopMetadata
            .extract(FingerprintKind::Image, Path::new("/tmp/x.png"))
            .await;
        assert!(extracted.is_none());
    }
}
