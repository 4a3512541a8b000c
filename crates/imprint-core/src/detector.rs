//! Phase-2 training-detection seam.
//!
//! Contract only: the surrounding platform composes an implementation behind
//! the `detector` capability feature. Nothing in this core calls these
//! operations or computes the reserved record fields they would populate.

use async_trait::async_trait;

use crate::embedding::EmbeddingVector;
use crate::error::Result;
use crate::record::Fingerprint;

/// A dataset the asset's fingerprint was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMatch {
    /// Identifier of the matched training dataset.
    pub dataset_id: String,
    /// Match confidence in [0, 1].
    pub score: f32,
}

/// Legal classification of a detected training use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalStatus {
    /// Below any actionable threshold.
    BelowThreshold,
    /// Requires human review.
    Review,
    /// Above the actionable threshold.
    Actionable,
}

/// Training-use detection over persisted fingerprints.
#[async_trait]
pub trait TrainingDetector: Send + Sync {
    /// Compare a fingerprint against known training datasets.
    async fn compare_datasets(
        &self,
        fingerprint: &Fingerprint,
        dataset_ids: &[String],
    ) -> Result<Vec<DatasetMatch>>;

    /// Measure drift of the asset's embedding against a baseline vector.
    async fn embedding_drift(
        &self,
        fingerprint: &Fingerprint,
        baseline: &EmbeddingVector,
    ) -> Result<f32>;

    /// Classify a detection against the legal-action threshold.
    async fn classify_legal_threshold(&self, fingerprint: &Fingerprint) -> Result<LegalStatus>;
}
