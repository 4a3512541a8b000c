//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use uuid::Uuid;

use imprint_analysis::{hamming_distance, FrameSampler};
use imprint_core::{FingerprintPipeline, LocalObjectStore, MemoryFingerprintStore};

use crate::output;

/// Fingerprint a local file through the full pipeline, using the file's
/// directory as the object store and an in-memory record store.
pub async fn hash(
    input: &Path,
    declared_type: Option<String>,
    user: &str,
    json: bool,
) -> anyhow::Result<()> {
    let declared = match declared_type {
        Some(declared) => declared,
        None => guess_type(input)?,
    };
    tracing::debug!(declared, input = %input.display(), "resolved asset type");

    let parent = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let object_key = input
        .file_name()
        .context("input path has no file name")?
        .to_string_lossy()
        .into_owned();

    let pipeline = FingerprintPipeline::new(
        Arc::new(LocalObjectStore::new(parent)),
        Arc::new(MemoryFingerprintStore::new()),
    );

    let asset_id = Uuid::new_v4().to_string();
    let record = pipeline
        .generate(&asset_id, &object_key, &declared, user)
        .await?;

    output::print_fingerprint(&record, json)
}

/// Probe a media file's stream properties.
pub fn probe(input: &Path, json: bool) -> anyhow::Result<()> {
    let probe = FrameSampler::new().probe_file(input)?;
    output::print_probe(&probe, json)
}

/// Hamming distance between two hex hashes.
pub fn compare(left: &str, right: &str, json: bool) -> anyhow::Result<()> {
    let distance = hamming_distance(left, right)?;
    let bits = (left.len() * 4) as u32;
    output::print_distance(distance, bits, json)
}

/// Guess the declared type from the file extension.
fn guess_type(input: &Path) -> anyhow::Result<String> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let declared = match ext.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tiff" => "image",
        "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aac" | "opus" => "audio",
        "mp4" | "mov" | "mkv" | "webm" | "avi" => "video",
        "txt" | "md" | "text" => "text",
        _ => bail!(
            "cannot guess asset type for '.{ext}', pass --type image|audio|video|text"
        ),
    };
    Ok(declared.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_type() {
        assert_eq!(guess_type(Path::new("a.PNG")).unwrap(), "image");
        assert_eq!(guess_type(Path::new("a.flac")).unwrap(), "audio");
        assert_eq!(guess_type(Path::new("clip.mkv")).unwrap(), "video");
        assert_eq!(guess_type(Path::new("notes.md")).unwrap(), "text");
        assert!(guess_type(Path::new("a.xyz")).is_err());
        assert!(guess_type(Path::new("noext")).is_err());
    }
}
