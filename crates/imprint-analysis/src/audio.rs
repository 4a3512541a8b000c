//! Audio spectral analysis: mel-spectrogram, chromagram, spectral centroid.
//!
//! FFmpeg decodes and resamples any input container to mono PCM at the fixed
//! analysis rate, so results are comparable across source formats. The
//! feature matrices are content-hashed (SHA-256) instead of stored in full;
//! downstream similarity checks only need (near-)equality of the digests.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::dsp::{self, MelFilterBank, Stft};
use crate::error::{AnalysisError, Result};
use crate::types::SpectralData;

/// Configuration for spectral analysis.
#[derive(Debug, Clone)]
pub struct SpectralConfig {
    /// Fixed analysis sample rate; sources are resampled to this.
    pub sample_rate: u32,
    /// Number of mel bands.
    pub n_mels: usize,
    /// Number of chroma (pitch-class) bins.
    pub n_chroma: usize,
    /// Upper frequency bound for mel and chroma analysis (Hz).
    pub fmax: f32,
    /// FFT window size.
    pub fft_size: usize,
    /// Hop size between frames.
    pub hop_size: usize,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            n_mels: 128,
            n_chroma: 12,
            fmax: 8_000.0,
            fft_size: 2048,
            hop_size: 512,
        }
    }
}

/// Audio analyzer producing the spectral summary bundle.
pub struct SpectralAnalyzer {
    config: SpectralConfig,
}

impl SpectralAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SpectralConfig::default())
    }

    /// Create an analyzer with a custom configuration.
    pub fn with_config(config: SpectralConfig) -> Self {
        Self { config }
    }

    /// Decode an audio file and analyze it.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<SpectralData> {
        let path = path.as_ref();
        info!("Analyzing audio: {}", path.display());

        let samples = self.decode_audio(path)?;
        self.analyze_samples(&samples, self.config.sample_rate)
    }

    /// Analyze already-decoded mono PCM samples.
    ///
    /// Pure and deterministic: the same samples always produce the same
    /// digests.
    pub fn analyze_samples(&self, samples: &[f32], sample_rate: u32) -> Result<SpectralData> {
        let stft = Stft::new(self.config.fft_size, self.config.hop_size);
        let magnitude = stft.magnitude_spectrogram(samples)?;
        let power = magnitude.mapv(|m| m * m);
        debug!(
            frames = magnitude.dim().1,
            bins = magnitude.dim().0,
            "computed spectrogram"
        );

        let bank = MelFilterBank::new(
            self.config.n_mels,
            sample_rate,
            self.config.fft_size,
            self.config.fmax,
        );
        let mut mel = bank.apply(&power);
        dsp::power_to_log(&mut mel);

        let chroma = dsp::chromagram(
            &power,
            sample_rate,
            self.config.fft_size,
            self.config.n_chroma,
            self.config.fmax,
        );

        let centroids = dsp::spectral_centroids(&magnitude, sample_rate, self.config.fft_size);
        let mean = centroids.iter().sum::<f32>() / centroids.len() as f32;
        let variance = centroids
            .iter()
            .map(|&c| (c - mean) * (c - mean))
            .sum::<f32>()
            / centroids.len() as f32;

        Ok(SpectralData {
            mel_spectrogram_hash: dsp::content_hash(&mel),
            chromagram_hash: dsp::content_hash(&chroma),
            spectral_centroid_mean: mean,
            spectral_centroid_std: variance.sqrt(),
            duration: samples.len() as f64 / sample_rate as f64,
            sample_rate,
            n_mels: self.config.n_mels,
            n_chroma: self.config.n_chroma,
        })
    }

    /// Decode any audio container to mono PCM at the analysis rate via
    /// FFmpeg, reading the intermediate WAV back with hound.
    fn decode_audio(&self, path: &Path) -> Result<Vec<f32>> {
        let scratch = tempfile::Builder::new()
            .prefix("imprint-audio-")
            .suffix(".wav")
            .tempfile()?;

        let output = Command::new("ffmpeg")
            .args([
                "-i",
                &path.to_string_lossy(),
                "-vn", // No video
                "-acodec",
                "pcm_s16le", // 16-bit PCM
                "-ar",
                &self.config.sample_rate.to_string(),
                "-ac",
                "1", // Mono
                "-y", // Overwrite
                &scratch.path().to_string_lossy(),
            ])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AnalysisError::DecoderMissing("ffmpeg not found in PATH".into())
                } else {
                    AnalysisError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::UnreadableAudio(
                stderr.lines().last().unwrap_or("ffmpeg decode failed").to_string(),
            ));
        }

        let reader = hound::WavReader::open(scratch.path())
            .map_err(|e| AnalysisError::UnreadableAudio(e.to_string()))?;
        let spec = reader.spec();
        debug!("Decoded audio spec: {:?}", spec);

        let samples: Vec<f32> = reader
            .into_samples::<i16>()
            .filter_map(|s| s.ok())
            .map(|s| s as f32 / 32768.0)
            .collect();

        if samples.is_empty() {
            return Err(AnalysisError::EmptySource);
        }
        info!(
            "Decoded {} samples at {} Hz",
            samples.len(),
            self.config.sample_rate
        );
        Ok(samples)
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
        let num_samples = (sample_rate as f32 * duration_secs) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = SpectralAnalyzer::new();
        let samples = sine(440.0, 22_050, 2.0);

        let a = analyzer.analyze_samples(&samples, 22_050).unwrap();
        let b = analyzer.analyze_samples(&samples, 22_050).unwrap();

        assert_eq!(a.mel_spectrogram_hash, b.mel_spectrogram_hash);
        assert_eq!(a.chromagram_hash, b.chromagram_hash);
        assert_eq!(a.spectral_centroid_mean, b.spectral_centroid_mean);
    }

    #[test]
    fn test_bundle_shape() {
        let analyzer = SpectralAnalyzer::new();
        let samples = sine(440.0, 22_050, 1.0);
        let data = analyzer.analyze_samples(&samples, 22_050).unwrap();

        assert_eq!(data.mel_spectrogram_hash.len(), 64);
        assert_eq!(data.chromagram_hash.len(), 64);
        assert_eq!(data.n_mels, 128);
        assert_eq!(data.n_chroma, 12);
        assert_eq!(data.sample_rate, 22_050);
        assert!((data.duration - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_different_audio_different_hashes() {
        let analyzer = SpectralAnalyzer::new();
        let a = analyzer
            .analyze_samples(&sine(440.0, 22_050, 1.0), 22_050)
            .unwrap();
        let b = analyzer
            .analyze_samples(&sine(880.0, 22_050, 1.0), 22_050)
            .unwrap();

        assert_ne!(a.mel_spectrogram_hash, b.mel_spectrogram_hash);
        assert_ne!(a.chromagram_hash, b.chromagram_hash);
    }

    #[test]
    fn test_centroid_reflects_pitch() {
        let analyzer = SpectralAnalyzer::new();
        let low = analyzer
            .analyze_samples(&sine(200.0, 22_050, 1.0), 22_050)
            .unwrap();
        let high = analyzer
            .analyze_samples(&sine(4_000.0, 22_050, 1.0), 22_050)
            .unwrap();

        assert!(high.spectral_centroid_mean > low.spectral_centroid_mean);
        // A steady tone has a stable centroid.
        assert!(low.spectral_centroid_std < low.spectral_centroid_mean);
    }

    #[test]
    fn test_empty_and_short_input() {
        let analyzer = SpectralAnalyzer::new();
        assert!(matches!(
            analyzer.analyze_samples(&[], 22_050),
            Err(AnalysisError::EmptySource)
        ));
        assert!(matches!(
            analyzer.analyze_samples(&[0.1; 64], 22_050),
            Err(AnalysisError::UnreadableAudio(_))
        ));
    }
}
