//! Output formatting: plain text or JSON.

use imprint_analysis::MediaProbe;
use imprint_core::{Fingerprint, ProcessingStatus};

/// Print a fingerprint record.
pub fn print_fingerprint(record: &Fingerprint, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("Fingerprint {}", record.id);
    println!("  asset:    {}", record.asset_id);
    println!("  type:     {}", record.kind);
    let status = match record.status {
        ProcessingStatus::Completed => "completed",
        ProcessingStatus::Failed => "failed",
        ProcessingStatus::Pending => "pending",
        ProcessingStatus::Processing => "processing",
    };
    println!("  status:   {}", status);
    println!("  duration: {:.3}s", record.processing_duration);

    if let Some(hashes) = &record.perceptual_hashes {
        println!("  phash:    {}", hashes.phash);
        println!("  ahash:    {}", hashes.ahash);
        println!("  dhash:    {}", hashes.dhash);
    }
    if let Some(spectral) = &record.spectral_data {
        println!("  mel:      {}", spectral.mel_spectrogram_hash);
        println!("  chroma:   {}", spectral.chromagram_hash);
        println!(
            "  centroid: {:.1} Hz (std {:.1})",
            spectral.spectral_centroid_mean, spectral.spectral_centroid_std
        );
        println!("  duration: {:.2}s audio", spectral.duration);
    }
    if let Some(video) = &record.video_hashes {
        println!("  frames:   {} sampled", video.total_frames_analyzed);
        println!("  average:  {}", video.average_hash);
    }
    if let Some(text_hash) = &record.text_hash {
        println!("  sha256:   {}", text_hash);
        if let Some(len) = record.text_length {
            println!("  length:   {} chars", len);
        }
    }
    if let Some(embedding) = &record.embedding {
        println!(
            "  embed:    {} dims via {}",
            embedding.vector.len(),
            embedding.model
        );
    }
    if let Some(error) = &record.error_message {
        println!("  error:    {}", error);
    }

    Ok(())
}

/// Print a media probe result.
pub fn print_probe(probe: &MediaProbe, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(probe)?);
        return Ok(());
    }

    match probe.fps {
        Some(fps) => println!("fps:      {:.3}", fps),
        None => println!("fps:      (unreported)"),
    }
    match probe.nb_frames {
        Some(frames) => println!("frames:   {}", frames),
        None => println!("frames:   (unreported)"),
    }
    if let (Some(w), Some(h)) = (probe.width, probe.height) {
        println!("size:     {}x{}", w, h);
    }
    if let Some(duration) = probe.duration {
        println!("duration: {:.2}s", duration);
    }

    Ok(())
}

/// Print a Hamming distance result.
pub fn print_distance(distance: u32, bits: u32, json: bool) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::json!({ "distance": distance, "bits": bits })
        );
        return Ok(());
    }

    println!("distance: {} / {} bits", distance, bits);
    Ok(())
}
