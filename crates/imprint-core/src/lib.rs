//! Imprint Core - Content Fingerprint Generation
//!
//! This crate turns a stored creative asset into a persisted content
//! fingerprint:
//! - Typed record model with one modality payload per fingerprint
//! - Collaborator contracts for object storage, the record store, semantic
//!   embeddings, and metadata enrichment
//! - The generation pipeline: fetch, analyze, embed, persist, with
//!   guaranteed scratch-file cleanup and exactly one terminal record per
//!   attempt
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    FingerprintPipeline                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ObjectStore ──▶ ScratchFile ──▶ imprint-analysis ──┐        │
//! │   (download)      (RAII temp)     (blocking pool)   │        │
//! │                                                     ▼        │
//! │  EmbeddingProvider ◀── description ◀── AnalysisOutcome       │
//! │   (optional, degrades)                              │        │
//! │                                                     ▼        │
//! │  FingerprintStore ◀──────── Fingerprint record (terminal)    │
//! │   (unique asset_id)                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Analysis algorithms live in `imprint-analysis`; this crate owns dispatch,
//! failure discipline, and persistence.

pub mod embedding;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod record;
pub mod storage;
pub mod store;

#[cfg(feature = "detector")]
pub mod detector;

pub use embedding::{
    EmbeddingConfig, EmbeddingProvider, EmbeddingVector, HttpEmbeddingProvider, NoopEmbedding,
};
pub use error::{Error, GenerationError, Phase, Result, StoreError};
pub use metadata::{MetadataExtractor, MetadataMap, NoopMetadata};
pub use pipeline::{FingerprintPipeline, PipelineConfig};
pub use record::{AnalysisOutcome, Fingerprint, FingerprintKind, Modality, ProcessingStatus};
pub use storage::{LocalObjectStore, ObjectStore};
pub use store::{FingerprintStore, MemoryFingerprintStore};

#[cfg(feature = "detector")]
pub use detector::{DatasetMatch, LegalStatus, TrainingDetector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the fingerprint core with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Imprint Core initialized");
}
