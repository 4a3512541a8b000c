//! Imprint Analysis - Per-Modality Fingerprint Signal Extraction
//!
//! This crate provides the algorithmic core of the Imprint fingerprinting
//! pipeline:
//! - **Perceptual Image Hashing**: pHash/aHash/dHash over a normalized canvas
//! - **Audio Spectral Summaries**: mel-spectrogram, chromagram, and spectral
//!   centroid statistics, content-hashed for compact storage
//! - **Video Frame Sampling**: timed frame extraction with per-frame pHash
//!   and a whole-video aggregate hash
//! - **Text Digests**: normalized cryptographic content hashing with basic
//!   statistics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  Stored Asset   │───▶│  Decode/Normalize│───▶│  Signal Extract │
//! └─────────────────┘    └──────────────────┘    └────────┬────────┘
//!                                                         │
//!         ┌───────────────────────┬───────────────────────┼──────────────┐
//!         ▼                       ▼                       ▼              ▼
//! ┌───────────────┐      ┌────────────────┐      ┌───────────────┐ ┌─────────┐
//! │ ImageHasher   │      │SpectralAnalyzer│      │ FrameSampler  │ │TextDigest│
//! │ (DCT/mean/    │      │ (STFT, mel,    │      │ (stride, per- │ │ (SHA-256)│
//! │  gradient)    │      │  chroma)       │      │  frame pHash) │ │          │
//! └───────────────┘      └────────────────┘      └───────────────┘ └─────────┘
//! ```
//!
//! Container and codec decode for audio/video is delegated to FFmpeg as an
//! external process; all feature math is in-process and deterministic.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod audio;
pub mod dsp;
pub mod error;
pub mod image;
pub mod text;
pub mod types;
pub mod video;

pub use audio::{SpectralAnalyzer, SpectralConfig};
pub use error::{AnalysisError, Result};
pub use self::image::{hamming_distance, HasherConfig, ImageHasher};
pub use text::TextDigest;
pub use types::*;
pub use video::{FrameSampler, MediaProbe, SamplerConfig};
