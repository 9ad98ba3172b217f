//! Seconds/frame conversion helpers
//!
//! Segment arithmetic inside the replacement pipeline is done in whole frames
//! at the track's sample rate; seconds only appear at the API boundary.
//! Rounding happens once, at the conversion point, so adjacent segments cannot
//! drift apart by accumulated error.

/// Convert a position in seconds to a frame index at the given sample rate.
///
/// Negative positions clamp to frame 0.
pub fn sec_to_frames(sec: f64, sample_rate: u32) -> usize {
    (sec.max(0.0) * sample_rate as f64).round() as usize
}

/// Convert a frame count to seconds at the given sample rate.
pub fn frames_to_sec(frames: usize, sample_rate: u32) -> f64 {
    frames as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sec_to_frames_exact() {
        assert_eq!(sec_to_frames(1.0, 44100), 44100);
        assert_eq!(sec_to_frames(0.5, 48000), 24000);
        assert_eq!(sec_to_frames(0.0, 44100), 0);
    }

    #[test]
    fn test_sec_to_frames_rounds() {
        // 0.0001 s at 44.1kHz is 4.41 frames, rounds to 4
        assert_eq!(sec_to_frames(0.0001, 44100), 4);
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(sec_to_frames(-3.0, 44100), 0);
    }

    #[test]
    fn test_round_trip() {
        let frames = sec_to_frames(2.5, 44100);
        assert!((frames_to_sec(frames, 44100) - 2.5).abs() < 1e-9);
    }
}
