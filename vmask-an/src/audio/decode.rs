//! Audio file decoding using symphonia
//!
//! Decodes a recording into a single in-memory PCM buffer at its native
//! sample rate. Mono and stereo pass through unchanged; tracks with more than
//! two channels are downmixed to stereo.
//!
//! # Supported Formats
//!
//! Per Cargo.toml symphonia features: WAV, MP3, FLAC, OGG/Vorbis, MP4/M4A.

use crate::audio::types::AudioBuffer;
use crate::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Input containers accepted for source recordings and surrogate clips
pub const SUPPORTED_INPUT_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a"];

/// Check a path against the supported container extensions
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_INPUT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an audio file into an interleaved PCM buffer
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    if !is_supported_extension(path) {
        return Err(Error::Decode(format!(
            "Unsupported input format: {}",
            path.display()
        )));
    }

    let file = File::open(path)
        .map_err(|e| Error::Decode(format!("Cannot open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create hint from file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            Error::Decode(format!("Unrecognized container {}: {}", path.display(), e))
        })?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode(format!("No audio track in {}", path.display())))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(44100);
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Unsupported codec in {}: {}", path.display(), e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(Error::Decode(format!(
                    "Read error in {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    let capacity = decoded.capacity() as u64;
                    sample_buf = Some(SampleBuffer::new(capacity, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            // A malformed packet is recoverable; skip it and keep decoding
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping malformed packet in {}: {}", path.display(), e);
            }
            Err(e) => {
                return Err(Error::Decode(format!(
                    "Decode failed for {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode(format!(
            "No audio data decoded from {}",
            path.display()
        )));
    }

    debug!(
        "Decoded {}: {} frames at {} Hz, {} channels",
        path.display(),
        samples.len() / channels,
        sample_rate,
        channels
    );

    if channels > 2 {
        let stereo = downmix_to_stereo(&samples, channels);
        return AudioBuffer::new(stereo, sample_rate, 2);
    }

    AudioBuffer::new(samples, sample_rate, channels as u16)
}

/// Probe a file's duration without decoding it in full.
///
/// Falls back to a full decode when the container carries no frame count.
pub fn probe_duration_sec(path: &Path) -> Result<f64> {
    let file = File::open(path)
        .map_err(|e| Error::Decode(format!("Cannot open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            Error::Decode(format!("Unrecognized container {}: {}", path.display(), e))
        })?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| Error::Decode(format!("No audio track in {}", path.display())))?;

    match (track.codec_params.n_frames, track.codec_params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Ok(frames as f64 / rate as f64),
        _ => Ok(decode_file(path)?.duration_sec()),
    }
}

/// Average all channels of each frame into a stereo pair
fn downmix_to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    let frames = samples.len() / channels;
    let mut out = Vec::with_capacity(frames * 2);
    for frame in samples.chunks_exact(channels) {
        let avg = frame.iter().sum::<f32>() / channels as f32;
        out.push(avg);
        out.push(avg);
    }
    out
}

// ========================================
// Tests
// ========================================
