//! Video frame sampling and hashing.
//!
//! One FFmpeg process decodes the source and emits only the sampled frames
//! (one per `sampling_interval` seconds, derived from the stream frame rate)
//! as raw RGB scaled to the hashing canvas. Frames are read sequentially
//! from the pipe and pHashed; sampling stops at a hard frame cap so long
//! videos have bounded latency. The decoder process is released on every
//! exit path.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::image::{HasherConfig, ImageHasher};
use crate::types::VideoHashes;

/// Configuration for video frame sampling.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Seconds between sampled frames.
    pub sampling_interval: f64,
    /// Hard cap on frames hashed per video.
    pub max_frames: usize,
    /// Frame rate assumed when the stream does not report one.
    pub default_fps: f64,
    /// Square canvas side length; must match the image hasher canvas.
    pub canvas_size: u32,
    /// Perceptual hash bit-width.
    pub hash_size: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sampling_interval: 1.0,
            max_frames: 300,
            default_fps: 30.0,
            canvas_size: 256,
            hash_size: 16,
        }
    }
}

/// Stream properties reported by ffprobe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaProbe {
    /// Average frame rate, if the stream reports one.
    pub fps: Option<f64>,
    /// Total frame count, if the stream reports one.
    pub nb_frames: Option<u64>,
    /// Frame width in pixels.
    pub width: Option<u32>,
    /// Frame height in pixels.
    pub height: Option<u32>,
    /// Container duration in seconds.
    pub duration: Option<f64>,
}

/// Video sampler producing per-frame and aggregate perceptual hashes.
pub struct FrameSampler {
    config: SamplerConfig,
    hasher: ImageHasher,
}

impl FrameSampler {
    /// Create a sampler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SamplerConfig::default())
    }

    /// Create a sampler with a custom configuration.
    pub fn with_config(config: SamplerConfig) -> Self {
        let hasher = ImageHasher::with_config(HasherConfig {
            hash_size: config.hash_size,
            canvas_size: config.canvas_size,
        });
        Self { config, hasher }
    }

    /// Probe a video file with ffprobe.
    pub fn probe_file(&self, path: impl AsRef<Path>) -> Result<MediaProbe> {
        let path = path.as_ref();
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
                &path.to_string_lossy(),
            ])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AnalysisError::DecoderMissing("ffprobe not found in PATH".into())
                } else {
                    AnalysisError::Io(e)
                }
            })?;

        let json: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| AnalysisError::UnreadableVideo(format!("ffprobe output: {e}")))?;

        let video = json
            .streams
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| AnalysisError::UnreadableVideo("no video stream found".into()))?;

        let fps = video
            .avg_frame_rate
            .as_deref()
            .and_then(parse_rate)
            .or_else(|| video.r_frame_rate.as_deref().and_then(parse_rate));

        Ok(MediaProbe {
            fps,
            nb_frames: video.nb_frames.and_then(|n| n.parse().ok()),
            width: video.width,
            height: video.height,
            duration: json
                .format
                .and_then(|f| f.duration)
                .and_then(|d| d.parse().ok()),
        })
    }

    /// Sample and hash a video file.
    pub fn sample_file(&self, path: impl AsRef<Path>) -> Result<VideoHashes> {
        let path = path.as_ref();
        info!("Sampling video: {}", path.display());

        let probe = self.probe_file(path)?;
        let fps = match probe.fps {
            Some(fps) if fps > 0.0 => fps,
            _ => {
                warn!(
                    fallback = self.config.default_fps,
                    "stream reports no frame rate, assuming default"
                );
                self.config.default_fps
            }
        };
        let stride = stride_for(fps, self.config.sampling_interval);
        let total_video_frames = total_frames(&probe, fps);
        debug!(fps, stride, total_video_frames, "derived sampling plan");

        let cs = self.config.canvas_size;
        let filter = format!("select=not(mod(n\\,{stride})),scale={cs}:{cs}");
        let child = Command::new("ffmpeg")
            .args([
                "-i",
                &path.to_string_lossy(),
                "-an", // No audio
                "-vf",
                &filter,
                "-vsync",
                "vfr",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AnalysisError::DecoderMissing("ffmpeg not found in PATH".into())
                } else {
                    AnalysisError::Io(e)
                }
            })?;

        // The guard kills and reaps the decoder on every exit path,
        // including the early stop at the frame cap.
        let mut guard = DecoderGuard { child };
        let stdout = guard
            .child
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::UnreadableVideo("decoder stdout unavailable".into()))?;

        let (frame_hashes, capped) = self.hash_frames(stdout)?;
        if capped {
            info!(cap = self.config.max_frames, "frame cap reached, stopping early");
        } else {
            // Decoder ran to completion; reap it and check the verdict.
            let status = guard.child.wait()?;
            if frame_hashes.is_empty() {
                return Err(AnalysisError::UnreadableVideo(format!(
                    "no frames decoded (ffmpeg exit: {status})"
                )));
            }
        }
        drop(guard);

        let average_hash = average_hash_hex(&frame_hashes)?;
        info!(
            frames = frame_hashes.len(),
            total_video_frames, "video hashing complete"
        );

        Ok(VideoHashes {
            total_frames_analyzed: frame_hashes.len(),
            frame_hashes,
            average_hash,
            sampling_interval: self.config.sampling_interval,
            total_video_frames,
            fps,
        })
    }

    /// Read canvas-sized RGB24 frames from `reader` and pHash each, up to
    /// the frame cap. Returns the hashes and whether the cap cut sampling
    /// short.
    fn hash_frames<R: Read>(&self, mut reader: R) -> Result<(Vec<String>, bool)> {
        let cs = self.config.canvas_size;
        let frame_len = (cs * cs * 3) as usize;
        let mut buf = vec![0u8; frame_len];
        let mut hashes = Vec::new();

        loop {
            if hashes.len() >= self.config.max_frames {
                return Ok((hashes, true));
            }
            if !read_frame(&mut reader, &mut buf)? {
                return Ok((hashes, false));
            }
            let rgb = RgbImage::from_raw(cs, cs, buf.clone())
                .ok_or_else(|| AnalysisError::UnreadableVideo("truncated frame data".into()))?;
            hashes.push(self.hasher.phash(&DynamicImage::ImageRgb8(rgb)));
        }
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `buf` with the next frame; `Ok(false)` on (possibly partial) EOF.
fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Frame stride for a sampling interval, clamped to at least one frame.
fn stride_for(fps: f64, sampling_interval: f64) -> u64 {
    ((fps * sampling_interval).round() as u64).max(1)
}

/// Reported frame count, or an estimate from duration when unreported.
fn total_frames(probe: &MediaProbe, fps: f64) -> u64 {
    match probe.nb_frames {
        Some(n) => n,
        None => {
            let estimate = probe
                .duration
                .map(|d| (d * fps).round() as u64)
                .unwrap_or(0);
            debug!(estimate, "frame count unreported, estimated from duration");
            estimate
        }
    }
}

/// Parse an ffprobe rational like `"30000/1001"`.
fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Average the per-frame hashes as big-endian integers and re-encode to hex.
///
/// This is the legacy whole-video aggregate: the integer mean of the
/// per-frame hash values, not a hash of an averaged frame.
fn average_hash_hex(hashes: &[String]) -> Result<String> {
    let first = hashes
        .first()
        .ok_or_else(|| AnalysisError::UnreadableVideo("no frames to aggregate".into()))?;
    let nbytes = first.len() / 2;

    // Per-byte sums, then normalize to base 256 and long-divide by the
    // frame count, most significant digit first.
    let mut digits = vec![0u64; nbytes];
    for hash in hashes {
        let bytes = hex::decode(hash).map_err(|e| AnalysisError::InvalidHash(e.to_string()))?;
        if bytes.len() != nbytes {
            return Err(AnalysisError::InvalidHash(format!(
                "hash widths differ ({} vs {})",
                bytes.len() * 2,
                first.len()
            )));
        }
        for (digit, &byte) in digits.iter_mut().zip(bytes.iter()) {
            *digit += byte as u64;
        }
    }

    let mut carry = 0u64;
    for digit in digits.iter_mut().rev() {
        let value = *digit + carry;
        *digit = value % 256;
        carry = value / 256;
    }

    let count = hashes.len() as u64;
    let mut remainder = carry;
    let mut out = Vec::with_capacity(nbytes);
    for &digit in &digits {
        let current = remainder * 256 + digit;
        out.push((current / count) as u8);
        remainder = current % count;
    }

    Ok(hex::encode(out))
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Option<Vec<ProbeStream>>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Kills and reaps the decoder child when dropped.
struct DecoderGuard {
    child: Child,
}

impl Drop for DecoderGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
