//! Benchmarks for the hot analysis paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, RgbImage};
use imprint_analysis::{ImageHasher, SpectralAnalyzer, TextDigest};

fn gradient_image(size: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        let v = ((x + y) * 255 / (size * 2)) as u8;
        image::Rgb([v, v / 2, 255 - v])
    }))
}

fn sine(freq: f32, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect()
}

fn bench_image_hashing(c: &mut Criterion) {
    let hasher = ImageHasher::new();
    let img = gradient_image(512);

    c.bench_function("image_hash_bundle_512", |b| {
        b.iter(|| hasher.hash_image(black_box(&img)))
    });
    c.bench_function("image_phash_only_512", |b| {
        b.iter(|| hasher.phash(black_box(&img)))
    });
}

fn bench_spectral_analysis(c: &mut Criterion) {
    let analyzer = SpectralAnalyzer::new();
    let samples = sine(440.0, 22_050, 5.0);

    c.bench_function("spectral_analyze_5s", |b| {
        b.iter(|| analyzer.analyze_samples(black_box(&samples), 22_050).unwrap())
    });
}

fn bench_text_digest(c: &mut Criterion) {
    let text = "the quick brown fox jumps over the lazy dog\n".repeat(200);

    c.bench_function("text_digest_8k", |b| {
        b.iter(|| TextDigest::digest(black_box(&text)))
    });
}

criterion_group!(
    benches,
    bench_image_hashing,
    bench_spectral_analysis,
    bench_text_digest
);
criterion_main!(benches);
