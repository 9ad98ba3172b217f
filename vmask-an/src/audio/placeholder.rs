//! Placeholder segment synthesis
//!
//! When no surrogate clip resolves at any fallback level, or a clip cannot be
//! converted to the track's format, the annotated span is filled with a quiet
//! tone instead. A missing clip is a warning, never a request failure.

use crate::audio::types::{AudioBuffer, SampleSpec};

/// Tone frequency for placeholder audio
pub const PLACEHOLDER_TONE_HZ: f64 = 440.0;

/// Placeholder amplitude, kept well below full scale
pub const PLACEHOLDER_AMPLITUDE: f32 = 0.1;

/// Generate a placeholder tone with an exact frame count
pub fn generate_frames(frames: usize, spec: SampleSpec) -> AudioBuffer {
    let mut samples = Vec::with_capacity(frames * spec.channels as usize);

    for i in 0..frames {
        let t = i as f64 / spec.sample_rate as f64;
        let value =
            (2.0 * std::f64::consts::PI * PLACEHOLDER_TONE_HZ * t).sin() as f32 * PLACEHOLDER_AMPLITUDE;
        for _ in 0..spec.channels {
            samples.push(value);
        }
    }

    AudioBuffer::from_parts(samples, spec)
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use vmask_common::time::sec_to_frames;

    #[test]
    fn test_frame_count_matches_request() {
        let spec = SampleSpec { sample_rate: 44100, channels: 2 };
        let buf = generate_frames(sec_to_frames(1.5, 44100), spec);
        assert_eq!(buf.frames(), 66150);
        assert_eq!(buf.channels(), 2);
    }

    #[test]
    fn test_amplitude_is_bounded() {
        let spec = SampleSpec { sample_rate: 8000, channels: 1 };
        let buf = generate_frames(2000, spec);
        assert!(buf
            .samples()
            .iter()
            .all(|s| s.abs() <= PLACEHOLDER_AMPLITUDE + 1e-6));
    }

    #[test]
    fn test_zero_frames_is_empty() {
        let spec = SampleSpec { sample_rate: 44100, channels: 2 };
        assert!(generate_frames(0, spec).is_empty());
    }
}
