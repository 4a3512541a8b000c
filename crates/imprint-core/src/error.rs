//! Error types for the fingerprint core.

use thiserror::Error;

use imprint_analysis::AnalysisError;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The declared asset type is not in the supported set.
    #[error("Unsupported fingerprint type: {0}")]
    UnsupportedType(String),

    /// A per-modality analysis failure (unreadable source, missing decoder).
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Fetching the source object from storage failed.
    #[error("Storage fetch failed: {0}")]
    Storage(#[source] StoreError),

    /// Persisting the fingerprint record failed.
    #[error("Fingerprint persistence failed: {0}")]
    Persist(#[source] StoreError),

    /// Worker-pool or other internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Local filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code for analytics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            Error::Analysis(e) => e.error_code(),
            Error::Storage(_) => "STORAGE_FETCH",
            Error::Persist(_) => "PERSIST",
            Error::Internal(_) => "INTERNAL",
            Error::Io(_) => "IO",
        }
    }
}

/// Errors surfaced by the storage collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object key does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A fingerprint for this asset already exists (uniqueness constraint).
    #[error("Duplicate fingerprint for asset: {0}")]
    Duplicate(String),

    /// Backend-specific failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Filesystem-level failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline phase in which a generation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Declared-type validation, before any I/O.
    Validate,
    /// Downloading the source object into the scratch file.
    Fetch,
    /// Per-modality analysis.
    Analyze,
    /// Persisting the terminal record.
    Persist,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Validate => "validate",
            Phase::Fetch => "fetch",
            Phase::Analyze => "analyze",
            Phase::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// The error callers of [`crate::pipeline::FingerprintPipeline::generate`]
/// see: the underlying failure plus asset/phase context.
#[derive(Error, Debug)]
#[error("Fingerprint generation failed for asset {asset_id} ({object_key}) during {phase}: {source}")]
pub struct GenerationError {
    /// Asset the attempt was for.
    pub asset_id: String,
    /// Object key that was (or would have been) fetched.
    pub object_key: String,
    /// Phase in which the failure occurred.
    pub phase: Phase,
    /// The underlying failure.
    #[source]
    pub source: Error,
}
