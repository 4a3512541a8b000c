//! Output bundles produced by the per-modality analyzers.
//!
//! These types are the modality payloads embedded in the persisted
//! fingerprint document; field names are part of the storage contract.

use serde::{Deserialize, Serialize};

/// Perceptual hash bundle computed from a still image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHashes {
    /// DCT-based hash, robust to compression and minor retouching.
    pub phash: String,
    /// Mean-threshold hash, sensitive to gross structural changes.
    pub ahash: String,
    /// Horizontal-gradient hash, robust to uniform scaling.
    pub dhash: String,
    /// Hash bit-width; each hash encodes `hash_size * hash_size` bits.
    pub hash_size: u32,
}

/// Image analysis result: the hash bundle plus source dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnalysis {
    /// The persisted hash bundle.
    pub hashes: PerceptualHashes,
    /// Source image width in pixels, before canvas normalization.
    pub width: u32,
    /// Source image height in pixels, before canvas normalization.
    pub height: u32,
}

/// Spectral summary computed from an audio stream.
///
/// The mel-spectrogram and chromagram matrices are large and only compared
/// for (near-)equality downstream, so each is stored as a SHA-256 content
/// hash rather than in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralData {
    /// SHA-256 hex digest of the log-power mel-spectrogram.
    pub mel_spectrogram_hash: String,
    /// SHA-256 hex digest of the chromagram.
    pub chromagram_hash: String,
    /// Mean of the per-frame spectral centroid (Hz).
    pub spectral_centroid_mean: f32,
    /// Standard deviation of the per-frame spectral centroid (Hz).
    pub spectral_centroid_std: f32,
    /// Analyzed duration in seconds.
    pub duration: f64,
    /// Analysis sample rate in Hz (sources are resampled to this rate).
    pub sample_rate: u32,
    /// Number of mel bands.
    pub n_mels: usize,
    /// Number of chroma (pitch-class) bins.
    pub n_chroma: usize,
}

/// Sampled-frame hash bundle computed from a video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoHashes {
    /// Per-sampled-frame pHash hex strings, in playback order.
    pub frame_hashes: Vec<String>,
    /// Integer mean of the per-frame hashes, re-encoded to hex.
    pub average_hash: String,
    /// Seconds between sampled frames.
    pub sampling_interval: f64,
    /// Number of frames actually hashed (bounded by the frame cap).
    pub total_frames_analyzed: usize,
    /// Total frames in the source video (reported or estimated).
    pub total_video_frames: u64,
    /// Frame rate used for stride derivation.
    pub fps: f64,
}

/// Digest and basic statistics of a text asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDigestData {
    /// SHA-256 hex digest of the trimmed UTF-8 text.
    pub text_hash: String,
    /// Character count of the trimmed text.
    pub text_length: usize,
    /// Whitespace-separated word count.
    pub word_count: usize,
    /// Line count of the trimmed text.
    pub line_count: usize,
}
