//! Perceptual image hashing: pHash, aHash, and dHash over a fixed canvas.
//!
//! Every source image is normalized to the same square grayscale canvas with
//! a deterministic resampling filter before hashing, so hash equality is
//! invariant to source resolution. The three digests trade robustness
//! differently:
//! - pHash survives compression and minor recolor/retouch (DCT low-pass)
//! - aHash reacts to gross structural changes (mean threshold)
//! - dHash survives uniform scaling (horizontal gradient)

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::dsp::Dct2d;
use crate::error::{AnalysisError, Result};
use crate::types::{ImageAnalysis, PerceptualHashes};

/// Configuration for the perceptual hasher.
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash bit-width; each digest encodes `hash_size * hash_size` bits.
    pub hash_size: u32,
    /// Square canvas side length used for normalization.
    pub canvas_size: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            hash_size: 16,
            canvas_size: 256,
        }
    }
}

/// Perceptual image hasher.
pub struct ImageHasher {
    config: HasherConfig,
}

impl ImageHasher {
    /// Create a hasher with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HasherConfig::default())
    }

    /// Create a hasher with a custom configuration.
    pub fn with_config(config: HasherConfig) -> Self {
        Self { config }
    }

    /// Hash an image file on disk.
    pub fn hash_path(&self, path: impl AsRef<Path>) -> Result<ImageAnalysis> {
        let bytes = std::fs::read(path.as_ref())?;
        self.hash_bytes(&bytes)
    }

    /// Hash raw encoded image bytes.
    pub fn hash_bytes(&self, bytes: &[u8]) -> Result<ImageAnalysis> {
        if bytes.is_empty() {
            return Err(AnalysisError::EmptySource);
        }
        let img = image::load_from_memory(bytes)
            .map_err(|e| AnalysisError::UnreadableImage(e.to_string()))?;
        Ok(self.hash_image(&img))
    }

    /// Hash an already-decoded image.
    pub fn hash_image(&self, img: &DynamicImage) -> ImageAnalysis {
        let (width, height) = (img.width(), img.height());
        let canvas = self.normalize(img);
        debug!(width, height, canvas = self.config.canvas_size, "hashing image");

        let hashes = PerceptualHashes {
            phash: self.phash_canvas(&canvas),
            ahash: self.ahash_canvas(&canvas),
            dhash: self.dhash_canvas(&canvas),
            hash_size: self.config.hash_size,
        };

        ImageAnalysis {
            hashes,
            width,
            height,
        }
    }

    /// Compute only the pHash of a decoded image (used per video frame).
    pub fn phash(&self, img: &DynamicImage) -> String {
        let canvas = self.normalize(img);
        self.phash_canvas(&canvas)
    }

    /// Normalize to the grayscale canvas with Lanczos3 resampling.
    fn normalize(&self, img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        let cs = self.config.canvas_size;
        if gray.dimensions() == (cs, cs) {
            gray
        } else {
            imageops::resize(&gray, cs, cs, FilterType::Lanczos3)
        }
    }

    fn phash_canvas(&self, canvas: &GrayImage) -> String {
        let hs = self.config.hash_size as usize;
        let dct_size = hs * 4;

        let small = imageops::resize(canvas, dct_size as u32, dct_size as u32, FilterType::Lanczos3);
        let pixels: Vec<f32> = small.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

        let coeffs = Dct2d::new(dct_size).transform(&pixels);

        // Low-frequency block, median threshold.
        let mut block = Vec::with_capacity(hs * hs);
        for y in 0..hs {
            for x in 0..hs {
                block.push(coeffs[y * dct_size + x]);
            }
        }
        let median = median_of(&block);
        let bits: Vec<bool> = block.iter().map(|&c| c > median).collect();
        encode_bits(&bits)
    }

    fn ahash_canvas(&self, canvas: &GrayImage) -> String {
        let hs = self.config.hash_size;
        let small = imageops::resize(canvas, hs, hs, FilterType::Lanczos3);
        let pixels: Vec<f32> = small.pixels().map(|p| p.0[0] as f32).collect();

        let mean = pixels.iter().sum::<f32>() / pixels.len() as f32;
        let bits: Vec<bool> = pixels.iter().map(|&p| p > mean).collect();
        encode_bits(&bits)
    }

    fn dhash_canvas(&self, canvas: &GrayImage) -> String {
        let hs = self.config.hash_size;
        let small = imageops::resize(canvas, hs + 1, hs, FilterType::Lanczos3);

        let mut bits = Vec::with_capacity((hs * hs) as usize);
        for y in 0..hs {
            for x in 0..hs {
                let left = small.get_pixel(x, y).0[0];
                let right = small.get_pixel(x + 1, y).0[0];
                bits.push(right > left);
            }
        }
        encode_bits(&bits)
    }
}

impl Default for ImageHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Median of a slice; even-length inputs average the two middle values.
fn median_of(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Pack bits MSB-first into bytes and hex-encode lowercase.
fn encode_bits(bits: &[bool]) -> String {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    hex::encode(bytes)
}

/// Hamming distance between two hex-encoded hashes of equal width.
pub fn hamming_distance(a: &str, b: &str) -> Result<u32> {
    if a.len() != b.len() {
        return Err(AnalysisError::InvalidHash(format!(
            "hash widths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    let left = hex::decode(a).map_err(|e| AnalysisError::InvalidHash(e.to_string()))?;
    let right = hex::decode(b).map_err(|e| AnalysisError::InvalidHash(e.to_string()))?;

    Ok(left
        .iter()
        .zip(right.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Diagonal gradient with a dark block, enough structure for stable bits.
    fn test_image(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            if x > width / 4 && x < width / 2 && y > height / 4 && y < height / 2 {
                image::Rgb([10, 10, 10])
            } else {
                let v = ((x + y) * 255 / (width + height)) as u8;
                image::Rgb([v, v / 2, 255 - v])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_hash_lengths_and_charset() {
        let hasher = ImageHasher::new();
        let analysis = hasher.hash_image(&test_image(512, 512));
        let hashes = &analysis.hashes;

        assert_eq!(hashes.hash_size, 16);
        for h in [&hashes.phash, &hashes.ahash, &hashes.dhash] {
            assert_eq!(h.len(), 64); // 16 * 16 / 4
            assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
        }
        assert_eq!(analysis.width, 512);
        assert_eq!(analysis.height, 512);
    }

    #[test]
    fn test_identical_bytes_identical_hashes() {
        let hasher = ImageHasher::new();
        let a = hasher.hash_image(&test_image(300, 200));
        let b = hasher.hash_image(&test_image(300, 200));
        assert_eq!(a.hashes, b.hashes);
    }

    #[test]
    fn test_resolution_invariance() {
        // Same scene at different resolutions should land close in Hamming
        // space thanks to canvas normalization.
        let hasher = ImageHasher::new();
        let a = hasher.hash_image(&test_image(512, 512));
        let b = hasher.hash_image(&test_image(256, 256));

        let dist = hamming_distance(&a.hashes.phash, &b.hashes.phash).unwrap();
        assert!(dist < 20, "phash distance {dist} too large");
    }

    #[test]
    fn test_jpeg_reencode_stays_near() {
        let hasher = ImageHasher::new();
        let original = test_image(512, 512);

        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
            .encode_image(&original.to_rgb8())
            .unwrap();
        let reencoded = hasher.hash_bytes(&jpeg).unwrap();
        let direct = hasher.hash_image(&original);

        let dist = hamming_distance(&direct.hashes.phash, &reencoded.hashes.phash).unwrap();
        assert!(dist <= 16, "phash distance {dist} after jpeg re-encode");
    }

    #[test]
    fn test_different_content_differs() {
        let hasher = ImageHasher::new();
        let a = hasher.hash_image(&test_image(256, 256));
        let inverted = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
            let v = 255 - ((x + y) * 255 / 512) as u8;
            image::Rgb([v, v, v])
        }));
        let b = hasher.hash_image(&inverted);

        let dist = hamming_distance(&a.hashes.phash, &b.hashes.phash).unwrap();
        assert!(dist > 32, "phash distance {dist} suspiciously small");
    }

    #[test]
    fn test_empty_and_corrupt_input() {
        let hasher = ImageHasher::new();
        assert!(matches!(
            hasher.hash_bytes(&[]),
            Err(AnalysisError::EmptySource)
        ));
        assert!(matches!(
            hasher.hash_bytes(&[0xde, 0xad, 0xbe, 0xef]),
            Err(AnalysisError::UnreadableImage(_))
        ));
    }

    #[test]
    fn test_encode_bits_packing() {
        // 1000 0001 -> 0x81
        let mut bits = vec![false; 8];
        bits[0] = true;
        bits[7] = true;
        assert_eq!(encode_bits(&bits), "81");
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance("00ff", "00ff").unwrap(), 0);
        assert_eq!(hamming_distance("00ff", "0000").unwrap(), 8);
        assert_eq!(hamming_distance("0001", "0000").unwrap(), 1);
        assert!(hamming_distance("00", "0000").is_err());
        assert!(hamming_distance("zz", "zz").is_err());
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median_of(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median_of(&[3.0, 1.0, 2.0]), 2.0);
    }
}
