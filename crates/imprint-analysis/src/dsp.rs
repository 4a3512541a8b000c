//! Shared DSP plumbing: STFT, mel filterbank, chroma fold, 2D DCT.
//!
//! All functions here are pure and deterministic; the analyzers in
//! [`crate::audio`] and [`crate::image`] compose them.

use ndarray::Array2;
use ring::digest::{Context, SHA256};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{AnalysisError, Result};

/// Generate a Hann window of the given length.
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (len - 1) as f32).cos()))
        .collect()
}

/// Short-time Fourier transform over a fixed window/hop configuration.
pub struct Stft {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f32>,
}

impl Stft {
    /// Create an STFT processor with a Hann window.
    pub fn new(fft_size: usize, hop_size: usize) -> Self {
        Self {
            fft_size,
            hop_size,
            window: hann_window(fft_size),
        }
    }

    /// Number of frequency bins per frame (positive frequencies only).
    pub fn bins(&self) -> usize {
        self.fft_size / 2
    }

    /// FFT window size.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute the magnitude spectrogram, shape `(bins, frames)`.
    pub fn magnitude_spectrogram(&self, samples: &[f32]) -> Result<Array2<f32>> {
        if samples.is_empty() {
            return Err(AnalysisError::EmptySource);
        }
        if samples.len() < self.fft_size {
            return Err(AnalysisError::UnreadableAudio(format!(
                "stream shorter than one analysis window ({} < {} samples)",
                samples.len(),
                self.fft_size
            )));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.fft_size);

        let num_frames = (samples.len() - self.fft_size) / self.hop_size + 1;
        let bins = self.bins();
        let mut spectrogram = Array2::<f32>::zeros((bins, num_frames));

        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.fft_size];
        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_size;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(samples[start + i] * self.window[i], 0.0);
            }

            fft.process(&mut buffer);

            for (bin, value) in buffer[..bins].iter().enumerate() {
                let magnitude =
                    (value.re * value.re + value.im * value.im).sqrt() * 2.0 / self.fft_size as f32;
                spectrogram[[bin, frame_idx]] = magnitude;
            }
        }

        Ok(spectrogram)
    }
}

/// Convert a frequency in Hz to the HTK mel scale.
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert a mel value back to Hz.
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank mapping FFT bins onto mel bands.
pub struct MelFilterBank {
    /// Filter weights, shape `(n_mels, bins)`.
    filters: Array2<f32>,
}

impl MelFilterBank {
    /// Build a filterbank of `n_mels` triangular filters spanning 0..`fmax` Hz.
    pub fn new(n_mels: usize, sample_rate: u32, fft_size: usize, fmax: f32) -> Self {
        let bins = fft_size / 2;
        let fmax = fmax.min(sample_rate as f32 / 2.0);

        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let mut filters = Array2::<f32>::zeros((n_mels, bins));
        for m in 0..n_mels {
            let lower = edges[m];
            let center = edges[m + 1];
            let upper = edges[m + 2];
            for bin in 0..bins {
                let freq = bin as f32 * sample_rate as f32 / fft_size as f32;
                let weight = if freq >= lower && freq <= center && center > lower {
                    (freq - lower) / (center - lower)
                } else if freq > center && freq <= upper && upper > center {
                    (upper - freq) / (upper - center)
                } else {
                    0.0
                };
                filters[[m, bin]] = weight;
            }
        }

        Self { filters }
    }

    /// Apply the filterbank to a power spectrogram `(bins, frames)`,
    /// yielding a mel power spectrogram `(n_mels, frames)`.
    pub fn apply(&self, power: &Array2<f32>) -> Array2<f32> {
        self.filters.dot(power)
    }
}

/// Convert a power matrix to log-power (dB-like) scale in place.
pub fn power_to_log(matrix: &mut Array2<f32>) {
    for value in matrix.iter_mut() {
        *value = 10.0 * (*value + 1e-10).log10();
    }
}

/// Fold a power spectrogram `(bins, frames)` into a 12-bin chromagram
/// `(n_chroma, frames)`.
///
/// Each FFT bin between 20 Hz and `fmax` maps to the pitch class of its
/// nearest MIDI note; bin energy is accumulated and each frame is
/// L1-normalized.
pub fn chromagram(
    power: &Array2<f32>,
    sample_rate: u32,
    fft_size: usize,
    n_chroma: usize,
    fmax: f32,
) -> Array2<f32> {
    let (bins, frames) = power.dim();
    let sr = sample_rate as f32;

    // bin -> pitch class, precomputed once
    let mapping: Vec<Option<usize>> = (0..bins)
        .map(|bin| {
            let freq = bin as f32 * sr / fft_size as f32;
            if freq < 20.0 || freq > fmax {
                return None;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            Some(((midi.round() as i32 % n_chroma as i32 + n_chroma as i32)
                % n_chroma as i32) as usize)
        })
        .collect();

    let mut chroma = Array2::<f32>::zeros((n_chroma, frames));
    for frame in 0..frames {
        for bin in 0..bins {
            if let Some(pc) = mapping[bin] {
                chroma[[pc, frame]] += power[[bin, frame]];
            }
        }
        let total: f32 = (0..n_chroma).map(|pc| chroma[[pc, frame]]).sum::<f32>().max(1e-10);
        for pc in 0..n_chroma {
            chroma[[pc, frame]] /= total;
        }
    }

    chroma
}

/// Per-frame spectral centroid (Hz) of a magnitude spectrogram.
pub fn spectral_centroids(magnitude: &Array2<f32>, sample_rate: u32, fft_size: usize) -> Vec<f32> {
    let (bins, frames) = magnitude.dim();
    let sr = sample_rate as f32;

    (0..frames)
        .map(|frame| {
            let mut weighted = 0.0f32;
            let mut total = 0.0f32;
            for bin in 0..bins {
                let freq = bin as f32 * sr / fft_size as f32;
                let mag = magnitude[[bin, frame]];
                weighted += freq * mag;
                total += mag;
            }
            if total > 0.0 {
                weighted / total
            } else {
                0.0
            }
        })
        .collect()
}

/// SHA-256 content hash of an f32 matrix, hex-encoded.
///
/// The matrix is flattened row-major and each value written as
/// little-endian bytes, so the digest is a stable function of shape and
/// contents.
pub fn content_hash(matrix: &Array2<f32>) -> String {
    let mut context = Context::new(&SHA256);
    for &value in matrix.iter() {
        context.update(&value.to_le_bytes());
    }
    hex::encode(context.finish().as_ref())
}

/// 2D DCT-II over a square input, via a precomputed cosine basis.
///
/// Unnormalized (scipy-compatible up to a constant factor), which is all the
/// median-threshold pHash needs.
pub struct Dct2d {
    n: usize,
    basis: Vec<f32>,
}

impl Dct2d {
    /// Precompute the basis for an `n` x `n` transform.
    pub fn new(n: usize) -> Self {
        let mut basis = vec![0.0f32; n * n];
        for k in 0..n {
            for i in 0..n {
                basis[k * n + i] =
                    (std::f32::consts::PI * k as f32 * (i as f32 + 0.5) / n as f32).cos();
            }
        }
        Self { n, basis }
    }

    /// Transform a row-major `n` x `n` input; output is row-major with
    /// vertical frequency as the row index.
    pub fn transform(&self, input: &[f32]) -> Vec<f32> {
        let n = self.n;
        debug_assert_eq!(input.len(), n * n);

        // rows
        let mut rows = vec![0.0f32; n * n];
        for y in 0..n {
            for k in 0..n {
                let mut acc = 0.0f32;
                for x in 0..n {
                    acc += input[y * n + x] * self.basis[k * n + x];
                }
                rows[y * n + k] = acc;
            }
        }

        // columns
        let mut out = vec![0.0f32; n * n];
        for k in 0..n {
            for x in 0..n {
                let mut acc = 0.0f32;
                for y in 0..n {
                    acc += rows[y * n + x] * self.basis[k * n + y];
                }
                out[k * n + x] = acc;
            }
        }

        out
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
    fn test_hann_window_endpoints() {
        let window = hann_window(2048);
        assert!(window[0].abs() < 1e-6);
        assert!(window[2047].abs() < 1e-6);
        assert!((window[1024] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_spectrogram_peak_bin() {
        let sample_rate = 22_050;
        let samples = sine(440.0, sample_rate, 1.0);
        let stft = Stft::new(2048, 512);
        let spec = stft.magnitude_spectrogram(&samples).unwrap();

        // Peak bin of the first frame should sit near 440 Hz.
        let peak_bin = (0..spec.dim().0)
            .max_by(|&a, &b| spec[[a, 0]].partial_cmp(&spec[[b, 0]]).unwrap())
            .unwrap();
        let peak_freq = peak_bin as f32 * sample_rate as f32 / 2048.0;
        assert!((peak_freq - 440.0).abs() < 22.0, "peak at {peak_freq} Hz");
    }

    #[test]
    fn test_spectrogram_rejects_short_input() {
        let stft = Stft::new(2048, 512);
        assert!(matches!(
            stft.magnitude_spectrogram(&[0.0; 100]),
            Err(AnalysisError::UnreadableAudio(_))
        ));
        assert!(matches!(
            stft.magnitude_spectrogram(&[]),
            Err(AnalysisError::EmptySource)
        ));
    }

    #[test]
    fn test_mel_filterbank_shape_and_coverage() {
        let bank = MelFilterBank::new(128, 22_050, 2048, 8_000.0);
        assert_eq!(bank.filters.dim(), (128, 1024));

        // Every filter should carry some weight.
        for m in 0..128 {
            let row_sum: f32 = (0..1024).map(|b| bank.filters[[m, b]]).sum();
            assert!(row_sum > 0.0, "filter {m} is empty");
        }
    }

    #[test]
    fn test_chroma_maps_a440_to_pitch_class_a() {
        let sample_rate = 22_050;
        let samples = sine(440.0, sample_rate, 1.0);
        let stft = Stft::new(2048, 512);
        let power = stft.magnitude_spectrogram(&samples).unwrap().mapv(|m| m * m);
        let chroma = chromagram(&power, sample_rate, 2048, 12, 8_000.0);

        // MIDI 69 (A4) mod 12 == 9.
        let frame0: Vec<f32> = (0..12).map(|pc| chroma[[pc, 0]]).collect();
        let max_pc = (0..12)
            .max_by(|&a, &b| frame0[a].partial_cmp(&frame0[b]).unwrap())
            .unwrap();
        assert_eq!(max_pc, 9);
        // L1 normalized
        let total: f32 = frame0.iter().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_centroid_tracks_brightness() {
        let sample_rate = 22_050;
        let stft = Stft::new(2048, 512);

        let low = stft.magnitude_spectrogram(&sine(200.0, sample_rate, 1.0)).unwrap();
        let high = stft.magnitude_spectrogram(&sine(5_000.0, sample_rate, 1.0)).unwrap();

        let low_mean: f32 = {
            let c = spectral_centroids(&low, sample_rate, 2048);
            c.iter().sum::<f32>() / c.len() as f32
        };
        let high_mean: f32 = {
            let c = spectral_centroids(&high, sample_rate, 2048);
            c.iter().sum::<f32>() / c.len() as f32
        };
        assert!(high_mean > low_mean);
    }

    #[test]
    fn test_content_hash_is_deterministic_and_shape_sensitive() {
        let a = Array2::from_shape_fn((4, 8), |(i, j)| (i * 8 + j) as f32);
        let b = Array2::from_shape_fn((4, 8), |(i, j)| (i * 8 + j) as f32);
        assert_eq!(content_hash(&a), content_hash(&b));
        assert_eq!(content_hash(&a).len(), 64);

        let c = Array2::from_shape_fn((4, 8), |(i, j)| (i * 8 + j) as f32 + 1.0);
        assert_ne!(content_hash(&a), content_hash(&c));
    }

    #[test]
    fn test_dct_dc_term() {
        // DCT of a constant image concentrates all energy in [0][0].
        let dct = Dct2d::new(8);
        let out = dct.transform(&[1.0; 64]);
        assert!((out[0] - 64.0).abs() < 1e-3);
        for &coeff in &out[1..] {
            assert!(coeff.abs() < 1e-3);
        }
    }
}
