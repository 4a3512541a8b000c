//! The fingerprint generation pipeline.
//!
//! One call to [`FingerprintPipeline::generate`] takes an asset from
//! `received` through `fetched`, `analyzed`, optionally `embedded`, to a
//! persisted terminal record. Every attempt that passes type validation
//! leaves exactly one record behind, `completed` or `failed`, so callers can
//! always query what happened to an asset without reading logs.
//!
//! CPU-bound analysis is dispatched onto tokio's bounded blocking pool;
//! fetch, embed, and persist stay on the async path. The per-attempt scratch
//! file is owned by an RAII guard and removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use uuid::Uuid;

use imprint_analysis::{
    AnalysisError, FrameSampler, HasherConfig, ImageHasher, SamplerConfig, SpectralAnalyzer,
    SpectralConfig, TextDigest,
};

use crate::embedding::{EmbeddingProvider, EmbeddingVector, NoopEmbedding};
use crate::error::{Error, GenerationError, Phase};
use crate::metadata::{MetadataExtractor, NoopMetadata};
use crate::record::{AnalysisOutcome, Fingerprint, Modality};
use crate::storage::ObjectStore;
use crate::store::FingerprintStore;

/// Pipeline configuration: scratch location plus per-analyzer settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for per-attempt scratch files.
    pub scratch_dir: PathBuf,
    /// Image hasher settings.
    pub hasher: HasherConfig,
    /// Audio analyzer settings.
    pub spectral: SpectralConfig,
    /// Video sampler settings.
    pub sampler: SamplerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            hasher: HasherConfig::default(),
            spectral: SpectralConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

/// Orchestrates fingerprint generation over the collaborator contracts.
pub struct FingerprintPipeline {
    config: PipelineConfig,
    storage: Arc<dyn ObjectStore>,
    store: Arc<dyn FingerprintStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    metadata: Arc<dyn MetadataExtractor>,
}

impl FingerprintPipeline {
    /// Create a pipeline over the required collaborators; embedding and
    /// metadata default to their no-op implementations.
    pub fn new(storage: Arc<dyn ObjectStore>, store: Arc<dyn FingerprintStore>) -> Self {
        Self {
            config: PipelineConfig::default(),
            storage,
            store,
            embedder: Arc::new(NoopEmbedding),
            metadata: Arc::new(NoopMetadata),
        }
    }

    /// Override the pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an embedding provider.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Attach a metadata extractor.
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataExtractor>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Generate and persist the fingerprint for one stored asset.
    ///
    /// On success the completed record is returned. On any failure after
    /// type validation, a failed record is persisted (best effort) and the
    /// original failure is returned with asset and phase context. An
    /// unsupported `declared_type` fails fast with no side effects.
    pub async fn generate(
        &self,
        asset_id: &str,
        object_key: &str,
        declared_type: &str,
        user_id: &str,
    ) -> Result<Fingerprint, GenerationError> {
        let context = |phase: Phase, source: Error| GenerationError {
            asset_id: asset_id.to_string(),
            object_key: object_key.to_string(),
            phase,
            source,
        };

        let modality = match Modality::parse(declared_type) {
            Some(modality) => modality,
            None => {
                return Err(context(
                    Phase::Validate,
                    Error::UnsupportedType(declared_type.to_string()),
                ))
            }
        };

        let started = Instant::now();
        info!(asset_id, object_key, kind = %modality.kind(), "Generating fingerprint");

        match self.fetch_and_analyze(object_key, modality).await {
            Ok((outcome, embedding)) => {
                let record = Fingerprint::completed(
                    asset_id,
                    user_id,
                    outcome,
                    embedding,
                    started.elapsed().as_secs_f64(),
                );
                match self.store.insert(&record).await {
                    Ok(id) => {
                        info!(
                            asset_id,
                            record_id = %id,
                            duration = record.processing_duration,
                            "Fingerprint persisted"
                        );
                        Ok(record)
                    }
                    Err(e) => Err(context(Phase::Persist, Error::Persist(e))),
                }
            }
            Err((phase, source)) => {
                let record = Fingerprint::failed(
                    asset_id,
                    user_id,
                    modality.kind(),
                    source.to_string(),
                    started.elapsed().as_secs_f64(),
                );
                // Best effort: a secondary persistence failure must not mask
                // the original error.
                if let Err(e) = self.store.insert(&record).await {
                    error!(asset_id, error = %e, "Failed to persist failure record");
                }
                Err(context(phase, source))
            }
        }
    }

    /// Steps 2-5: scratch acquisition, fetch, analysis, embedding.
    async fn fetch_and_analyze(
        &self,
        object_key: &str,
        modality: Modality,
    ) -> Result<(AnalysisOutcome, Option<EmbeddingVector>), (Phase, Error)> {
        let scratch = ScratchFile::create(&self.config.scratch_dir, object_key)
            .map_err(|e| (Phase::Fetch, Error::Io(e)))?;

        self.storage
            .download(object_key, scratch.path())
            .await
            .map_err(|e| (Phase::Fetch, Error::Storage(e)))?;

        let path = scratch.path().to_path_buf();
        let config = self.config.clone();
        let outcome = tokio::task::spawn_blocking(move || run_analysis(modality, &path, &config))
            .await
            .map_err(|e| {
                (
                    Phase::Analyze,
                    Error::Internal(format!("analysis task failed: {e}")),
                )
            })?
            .map_err(|e| (Phase::Analyze, Error::Analysis(e)))?;

        let mut description = outcome.description();
        if let Some(map) = self.metadata.extract(modality.kind(), scratch.path()).await {
            if !map.is_empty() {
                description.push_str(" | ");
                description.push_str(&serde_json::Value::Object(map).to_string());
            }
        }
        let embedding = self.embedder.embed(&description).await;

        Ok((outcome, embedding))
        // scratch drops here, removing the temp file
    }
}

/// Exhaustive dispatch over the supported modalities; runs on the blocking
/// pool.
fn run_analysis(
    modality: Modality,
    path: &Path,
    config: &PipelineConfig,
) -> Result<AnalysisOutcome, AnalysisError> {
    match modality {
        Modality::Image => ImageHasher::with_config(config.hasher.clone())
            .hash_path(path)
            .map(AnalysisOutcome::Image),
        Modality::Audio => SpectralAnalyzer::with_config(config.spectral.clone())
            .analyze_file(path)
            .map(AnalysisOutcome::Audio),
        Modality::Video => FrameSampler::with_config(config.sampler.clone())
            .sample_file(path)
            .map(AnalysisOutcome::Video),
        Modality::Text => TextDigest::digest_file(path).map(AnalysisOutcome::Text),
    }
}

/// Per-attempt scratch file: uniquely named, extension preserved from the
/// object key, removed on drop regardless of how the attempt ended.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn create(dir: &Path, object_key: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let unique = Uuid::new_v4();
        let name = match Path::new(object_key).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("imprint-{unique}.{ext}"),
            None => format!("imprint-{unique}"),
        };
        Ok(Self {
            path: dir.join(name),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), "Failed to remove scratch file: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_preserves_extension_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchFile::create(dir.path(), "uploads/photo.PNG").unwrap();
            let path = scratch.path().to_path_buf();
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("PNG"));
            assert!(path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("imprint-"));

            std::fs::write(&path, b"data").unwrap();
            assert!(path.exists());
            path
        };
        // Guard dropped: file gone.
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::create(dir.path(), "blob").unwrap();
        assert!(scratch.path().extension().is_none());
    }

    #[test]
    fn test_scratch_drop_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::create(dir.path(), "never-written.bin").unwrap();
        drop(scratch); // nothing was downloaded; drop must not panic
    }

    #[test]
    fn test_scratch_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = ScratchFile::create(dir.path(), "x.png").unwrap();
        let b = ScratchFile::create(dir.path(), "x.png").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_text_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "Hello, World!").unwrap();

        let outcome = run_analysis(Modality::Text, &path, &PipelineConfig::default()).unwrap();
        match outcome {
            AnalysisOutcome::Text(t) => {
                assert_eq!(
                    t.text_hash,
                    "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
                );
            }
            other => panic!("expected text outcome, got {other:?}"),
        }
    }
}
