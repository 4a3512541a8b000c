//! Error types for the analysis crate.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Analysis error types.
///
/// Decode failures are surfaced per modality so the orchestrator can report
/// a human-readable cause without inspecting codec internals.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image bytes could not be decoded.
    #[error("Unreadable image data: {0}")]
    UnreadableImage(String),

    /// Audio could not be decoded or is too short to analyze.
    #[error("Unreadable audio data: {0}")]
    UnreadableAudio(String),

    /// Video could not be probed or decoded.
    #[error("Unreadable video data: {0}")]
    UnreadableVideo(String),

    /// An external decoder binary (ffmpeg/ffprobe) is not installed.
    #[error("Decoder not available: {0}")]
    DecoderMissing(String),

    /// The source contained no usable data.
    #[error("Source is empty")]
    EmptySource,

    /// A hash string was not valid lowercase hex of the expected width.
    #[error("Invalid hash encoding: {0}")]
    InvalidHash(String),

    /// Filesystem-level failure while reading source data.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Returns the error code for analytics.
    pub fn error_code(&self) -> &'static str {
        match self {
            AnalysisError::UnreadableImage(_) => "UNREADABLE_IMAGE",
            AnalysisError::UnreadableAudio(_) => "UNREADABLE_AUDIO",
            AnalysisError::UnreadableVideo(_) => "UNREADABLE_VIDEO",
            AnalysisError::DecoderMissing(_) => "DECODER_MISSING",
            AnalysisError::EmptySource => "EMPTY_SOURCE",
            AnalysisError::InvalidHash(_) => "INVALID_HASH",
            AnalysisError::Io(_) => "IO",
        }
    }
}
