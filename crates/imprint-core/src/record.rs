//! The persisted fingerprint record and its supporting types.
//!
//! Field names are part of the storage contract; downstream services query
//! on `fingerprint_type` and `processing_status` directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use imprint_analysis::{ImageAnalysis, PerceptualHashes, SpectralData, TextDigestData, VideoHashes};

use crate::embedding::EmbeddingVector;

/// Fingerprint type tag as stored in the record.
///
/// `Url` is representable (legacy records carry it) but the pipeline does
/// not generate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintKind {
    /// Still image.
    Image,
    /// Audio stream.
    Audio,
    /// Video stream.
    Video,
    /// Plain text.
    Text,
    /// External URL reference.
    Url,
}

impl std::fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FingerprintKind::Image => "image",
            FingerprintKind::Audio => "audio",
            FingerprintKind::Video => "video",
            FingerprintKind::Text => "text",
            FingerprintKind::Url => "url",
        };
        f.write_str(name)
    }
}

/// The closed set of analyzable modalities.
///
/// Dispatch happens over this enum, matched exhaustively, so an unknown
/// declared type is rejected before any I/O and the orchestrator has no
/// unreachable arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Perceptual image hashing.
    Image,
    /// Spectral audio analysis.
    Audio,
    /// Sampled-frame video hashing.
    Video,
    /// Text digesting.
    Text,
}

impl Modality {
    /// Parse a declared type tag; `None` for anything outside the supported
    /// set (including `url`).
    pub fn parse(declared: &str) -> Option<Self> {
        match declared {
            "image" => Some(Modality::Image),
            "audio" => Some(Modality::Audio),
            "video" => Some(Modality::Video),
            "text" => Some(Modality::Text),
            _ => None,
        }
    }

    /// The record tag for this modality.
    pub fn kind(&self) -> FingerprintKind {
        match self {
            Modality::Image => FingerprintKind::Image,
            Modality::Audio => FingerprintKind::Audio,
            Modality::Video => FingerprintKind::Video,
            Modality::Text => FingerprintKind::Text,
        }
    }
}

/// Processing state machine.
///
/// `Pending` and `Processing` exist only in flight; the pipeline persists
/// terminal states exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Queued, not yet started.
    Pending,
    /// Generation in progress.
    Processing,
    /// Terminal: analysis succeeded and the payload is populated.
    Completed,
    /// Terminal: generation failed; `error_message` carries the cause.
    Failed,
}

/// Typed result of one analysis dispatch: exactly one payload per modality.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// Image hashes plus source dimensions.
    Image(ImageAnalysis),
    /// Audio spectral summary.
    Audio(SpectralData),
    /// Video frame hashes.
    Video(VideoHashes),
    /// Text digest and statistics.
    Text(TextDigestData),
}

impl AnalysisOutcome {
    /// The record tag this outcome populates.
    pub fn kind(&self) -> FingerprintKind {
        match self {
            AnalysisOutcome::Image(_) => FingerprintKind::Image,
            AnalysisOutcome::Audio(_) => FingerprintKind::Audio,
            AnalysisOutcome::Video(_) => FingerprintKind::Video,
            AnalysisOutcome::Text(_) => FingerprintKind::Text,
        }
    }

    /// Short human-readable description of the asset, used as embedding
    /// input.
    pub fn description(&self) -> String {
        match self {
            AnalysisOutcome::Image(a) => format!(
                "image {}x{} px, phash {}",
                a.width,
                a.height,
                &a.hashes.phash[..a.hashes.phash.len().min(16)]
            ),
            AnalysisOutcome::Audio(s) => format!(
                "audio {:.1}s at {} Hz, brightness {:.0} Hz",
                s.duration, s.sample_rate, s.spectral_centroid_mean
            ),
            AnalysisOutcome::Video(v) => format!(
                "video {} frames at {:.2} fps, {} sampled",
                v.total_video_frames, v.fps, v.total_frames_analyzed
            ),
            AnalysisOutcome::Text(t) => format!(
                "text {} chars, {} words, {} lines",
                t.text_length, t.word_count, t.line_count
            ),
        }
    }
}

/// One persisted fingerprint record; 1:1 with an asset.
///
/// Exactly one modality payload is populated, selected by `kind`; the
/// constructors are the only creation paths and enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Opaque record identifier, generated at creation.
    pub id: String,
    /// Asset this fingerprint belongs to; unique across all fingerprints.
    pub asset_id: String,
    /// Owner of the asset.
    pub user_id: String,

    /// Modality tag; immutable once set.
    #[serde(rename = "fingerprint_type")]
    pub kind: FingerprintKind,

    /// Image payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_hashes: Option<PerceptualHashes>,
    /// Audio payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral_data: Option<SpectralData>,
    /// Video payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_hashes: Option<VideoHashes>,
    /// Text payload: content hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_hash: Option<String>,
    /// Text payload: character count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    /// Url payload (legacy records only; never produced here).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_metadata: Option<serde_json::Value>,

    /// Semantic embedding; present iff the provider succeeded.
    #[serde(rename = "embeddings", skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingVector>,

    /// Processing state; persisted records are always terminal.
    #[serde(rename = "processing_status")]
    pub status: ProcessingStatus,
    /// Human-readable failure cause, on the failed path.
    pub error_message: Option<String>,
    /// Wall-clock generation duration in seconds; set on both terminal
    /// paths.
    pub processing_duration: f64,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on any mutation.
    pub updated_at: DateTime<Utc>,

    /// Phase-2 field, reserved; never computed by this core.
    pub training_detected: Option<bool>,
    /// Phase-2 field, reserved; never computed by this core.
    pub dataset_matches: Option<Vec<String>>,
    /// Phase-2 field, reserved; never computed by this core.
    pub similarity_scores: Option<serde_json::Value>,
    /// Phase-2 field, reserved; never computed by this core.
    pub legal_status: Option<String>,
}

impl Fingerprint {
    fn blank(asset_id: &str, user_id: &str, kind: FingerprintKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            perceptual_hashes: None,
            spectral_data: None,
            video_hashes: None,
            text_hash: None,
            text_length: None,
            url_metadata: None,
            embedding: None,
            status: ProcessingStatus::Pending,
            error_message: None,
            processing_duration: 0.0,
            created_at: now,
            updated_at: now,
            training_detected: None,
            dataset_matches: None,
            similarity_scores: None,
            legal_status: None,
        }
    }

    /// Build a completed record from an analysis outcome.
    pub fn completed(
        asset_id: &str,
        user_id: &str,
        outcome: AnalysisOutcome,
        embedding: Option<EmbeddingVector>,
        processing_duration: f64,
    ) -> Self {
        let mut record = Self::blank(asset_id, user_id, outcome.kind());
        match outcome {
            AnalysisOutcome::Image(a) => record.perceptual_hashes = Some(a.hashes),
            AnalysisOutcome::Audio(s) => record.spectral_data = Some(s),
            AnalysisOutcome::Video(v) => record.video_hashes = Some(v),
            AnalysisOutcome::Text(t) => {
                record.text_hash = Some(t.text_hash);
                record.text_length = Some(t.text_length);
            }
        }
        record.embedding = embedding;
        record.status = ProcessingStatus::Completed;
        record.processing_duration = processing_duration;
        record
    }

    /// Build a failed record carrying the failure cause.
    pub fn failed(
        asset_id: &str,
        user_id: &str,
        kind: FingerprintKind,
        error_message: String,
        processing_duration: f64,
    ) -> Self {
        let mut record = Self::blank(asset_id, user_id, kind);
        record.status = ProcessingStatus::Failed;
        record.error_message = Some(error_message);
        record.processing_duration = processing_duration;
        record
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imprint_analysis::PerceptualHashes;

    fn image_outcome() -> AnalysisOutcome {
        AnalysisOutcome::Image(ImageAnalysis {
            hashes: PerceptualHashes {
                phash: "ab".repeat(32),
                ahash: "cd".repeat(32),
                dhash: "ef".repeat(32),
                hash_size: 16,
            },
            width: 512,
            height: 512,
        })
    }

    #[test]
    fn test_modality_parsing() {
        assert_eq!(Modality::parse("image"), Some(Modality::Image));
        assert_eq!(Modality::parse("audio"), Some(Modality::Audio));
        assert_eq!(Modality::parse("video"), Some(Modality::Video));
        assert_eq!(Modality::parse("text"), Some(Modality::Text));
        assert_eq!(Modality::parse("url"), None);
        assert_eq!(Modality::parse("IMAGE"), None);
        assert_eq!(Modality::parse(""), None);
    }

    #[test]
    fn test_completed_populates_only_matching_payload() {
        let record = Fingerprint::completed("a1", "u1", image_outcome(), None, 0.5);

        assert_eq!(record.kind, FingerprintKind::Image);
        assert_eq!(record.status, ProcessingStatus::Completed);
        assert!(record.perceptual_hashes.is_some());
        assert!(record.spectral_data.is_none());
        assert!(record.video_hashes.is_none());
        assert!(record.text_hash.is_none());
        assert!(record.error_message.is_none());
        assert_eq!(record.processing_duration, 0.5);
        // Phase-2 fields stay unset.
        assert!(record.training_detected.is_none());
        assert!(record.dataset_matches.is_none());
        assert!(record.similarity_scores.is_none());
        assert!(record.legal_status.is_none());
    }

    #[test]
    fn test_text_outcome_flattens_to_record_fields() {
        let outcome = AnalysisOutcome::Text(TextDigestData {
            text_hash: "00".repeat(32),
            text_length: 13,
            word_count: 2,
            line_count: 1,
        });
        let record = Fingerprint::completed("a1", "u1", outcome, None, 0.1);
        assert_eq!(record.text_hash.as_deref(), Some("00".repeat(32).as_str()));
        assert_eq!(record.text_length, Some(13));
    }

    #[test]
    fn test_failed_record_shape() {
        let record =
            Fingerprint::failed("a1", "u1", FingerprintKind::Video, "decode failed".into(), 1.25);

        assert_eq!(record.status, ProcessingStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("decode failed"));
        assert_eq!(record.processing_duration, 1.25);
        assert!(record.video_hashes.is_none());
    }

    #[test]
    fn test_serde_contract_field_names() {
        let record = Fingerprint::completed("a1", "u1", image_outcome(), None, 0.5);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["fingerprint_type"], "image");
        assert_eq!(json["processing_status"], "completed");
        assert!(json["perceptual_hashes"]["phash"].is_string());
        assert_eq!(json["perceptual_hashes"]["hash_size"], 16);
        // Unpopulated payloads are absent, reserved fields serialize null.
        assert!(json.get("spectral_data").is_none());
        assert!(json["training_detected"].is_null());
    }

    #[test]
    fn test_touch_refreshes_updated_at() {
        let mut record = Fingerprint::completed("a1", "u1", image_outcome(), None, 0.5);
        let before = record.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        record.touch();
        assert!(record.updated_at > before);
    }

    #[test]
    fn test_descriptions() {
        let desc = image_outcome().description();
        assert!(desc.contains("512x512"));

        let audio = AnalysisOutcome::Audio(SpectralData {
            mel_spectrogram_hash: String::new(),
            chromagram_hash: String::new(),
            spectral_centroid_mean: 1500.0,
            spectral_centroid_std: 10.0,
            duration: 12.5,
            sample_rate: 22_050,
            n_mels: 128,
            n_chroma: 12,
        });
        assert!(audio.description().contains("12.5s"));
    }
}
