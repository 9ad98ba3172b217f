//! Sample rate and channel conversion
//!
//! Surrogate clips arrive in whatever format they were recorded in. Before a
//! clip can replace a span of the source track it must match the track's
//! sample rate and channel count exactly; the track itself is never converted.
//! Resampling uses rubato's FastFixedIn (good quality/performance tradeoff).

use crate::audio::types::{AudioBuffer, SampleSpec};
use crate::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Convert a buffer to the target spec.
///
/// Channel layout is adjusted first, then the sample rate. Returns a copy
/// when the formats already match.
pub fn convert_to_spec(buffer: &AudioBuffer, target: SampleSpec) -> Result<AudioBuffer> {
    let spec = buffer.spec();
    if spec == target {
        return Ok(buffer.clone());
    }

    let channel_converted = if spec.channels != target.channels {
        convert_channels(buffer.samples(), spec.channels, target.channels)?
    } else {
        buffer.samples().to_vec()
    };

    let resampled = if spec.sample_rate != target.sample_rate {
        resample(
            &channel_converted,
            spec.sample_rate,
            target.sample_rate,
            target.channels,
        )?
    } else {
        channel_converted
    };

    AudioBuffer::new(resampled, target.sample_rate, target.channels)
}

/// Resample interleaved audio between arbitrary rates.
///
/// # Notes
/// If input is already at the output rate, returns a copy without resampling
pub fn resample(
    input: &[f32],
    input_rate: u32,
    output_rate: u32,
    channels: u16,
) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    debug!(
        "Resampling from {}Hz to {}Hz ({} channels)",
        input_rate, output_rate, channels
    );

    // De-interleave samples for rubato (which expects planar format)
    let planar_input = deinterleave(input, channels);
    let input_frames = planar_input[0].len();

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0, // max_relative_ratio (no runtime changes)
        PolynomialDegree::Septic,
        input_frames,
        channels as usize,
    )
    .map_err(|e| Error::FormatConversion(format!("Failed to create resampler: {}", e)))?;

    let planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::FormatConversion(format!("Resampling failed: {}", e)))?;

    let interleaved_output = interleave(planar_output);

    debug!(
        "Resampled {} input frames to {} output frames",
        input_frames,
        interleaved_output.len() / channels as usize
    );

    Ok(interleaved_output)
}

/// Convert between mono and stereo layouts
pub fn convert_channels(samples: &[f32], from: u16, to: u16) -> Result<Vec<f32>> {
    match (from, to) {
        (f, t) if f == t => Ok(samples.to_vec()),
        (1, 2) => {
            let mut out = Vec::with_capacity(samples.len() * 2);
            for &s in samples {
                out.push(s);
                out.push(s);
            }
            Ok(out)
        }
        (2, 1) => {
            let mut out = Vec::with_capacity(samples.len() / 2);
            for frame in samples.chunks_exact(2) {
                out.push((frame[0] + frame[1]) / 2.0);
            }
            Ok(out)
        }
        (f, t) => Err(Error::FormatConversion(format!(
            "Unsupported channel conversion: {} -> {}",
            f, t
        ))),
    }
}

/// Convert interleaved samples to planar format.
///
/// Input:  [L, R, L, R, L, R, ...]
/// Output: [[L, L, L, ...], [R, R, R, ...]]
fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let num_channels = channels as usize;
    let num_frames = samples.len() / num_channels;

    let mut planar = vec![Vec::with_capacity(num_frames); num_channels];

    for frame_idx in 0..num_frames {
        for ch_idx in 0..num_channels {
            planar[ch_idx].push(samples[frame_idx * num_channels + ch_idx]);
        }
    }

    planar
}

/// Convert planar samples to interleaved format.
///
/// Input:  [[L, L, L, ...], [R, R, R, ...]]
/// Output: [L, R, L, R, L, R, ...]
fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
    if planar.is_empty() {
        return Vec::new();
    }

    let num_channels = planar.len();
    let num_frames = planar[0].len();
    let mut interleaved = Vec::with_capacity(num_frames * num_channels);

    for frame_idx in 0..num_frames {
        for ch_idx in 0..num_channels {
            interleaved.push(planar[ch_idx][frame_idx]);
        }
    }

    interleaved
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3 stereo frames
        let planar = deinterleave(&interleaved, 2);

        assert_eq!(planar.len(), 2);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]); // Left channel
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]); // Right channel
    }

    #[test]
    fn test_interleave() {
        let planar = vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]];
        let interleaved = interleave(planar);

        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_resample_same_rate() {
        let input = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let output = resample(&input, 44100, 44100, 2).unwrap();

        assert_eq!(output, input);
    }

    #[test]
    fn test_resample_different_rate() {
        // Simple sine wave at 48kHz
        let input_rate = 48000;
        let output_rate = 44100;
        let duration_frames = 1000;

        let mut input = Vec::with_capacity(duration_frames * 2);
        for i in 0..duration_frames {
            let t = i as f32 / input_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            input.push(sample); // Left
            input.push(sample); // Right
        }

        let output = resample(&input, input_rate, output_rate, 2).unwrap();

        let expected_frames = (duration_frames as f64 * output_rate as f64 / input_rate as f64) as usize;
        let output_frames = output.len() / 2;

        // Allow some variance due to resampler internals
        assert!(
            output_frames >= expected_frames - 10 && output_frames <= expected_frames + 10,
            "Expected ~{} frames, got {}",
            expected_frames,
            output_frames
        );
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let out = convert_channels(&[0.5, -0.5], 1, 2).unwrap();
        assert_eq!(out, vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_stereo_to_mono_averages() {
        let out = convert_channels(&[1.0, 0.0, 0.0, -1.0], 2, 1).unwrap();
        assert_eq!(out, vec![0.5, -0.5]);
    }

    #[test]
    fn test_unsupported_channel_conversion() {
        assert!(convert_channels(&[0.0; 6], 3, 2).is_err());
    }

    #[test]
    fn test_convert_to_spec_matching_is_copy() {
        let buf = AudioBuffer::new(vec![0.1, 0.2], 44100, 2).unwrap();
        let out = convert_to_spec(&buf, buf.spec()).unwrap();
        assert_eq!(out.samples(), buf.samples());
    }

    #[test]
    fn test_convert_to_spec_channels_and_rate() {
        let frames = 2000;
        let samples: Vec<f32> = (0..frames).map(|i| (i as f32 / 100.0).sin()).collect();
        let buf = AudioBuffer::new(samples, 48000, 1).unwrap();

        let target = SampleSpec { sample_rate: 44100, channels: 2 };
        let out = convert_to_spec(&buf, target).unwrap();

        assert_eq!(out.channels(), 2);
        assert_eq!(out.sample_rate(), 44100);
        let expected = (frames as f64 * 44100.0 / 48000.0) as usize;
        assert!((out.frames() as i64 - expected as i64).unsigned_abs() < 10);
    }
}
