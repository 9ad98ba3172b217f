//! PCM buffer types
//!
//! # Sample Format
//!
//! - Interleaved f32 samples (`[L, R, L, R, ...]` for stereo)
//! - One frame = one sample per channel
//! - The source track's native sample rate and channel count are preserved
//!   end to end; surrogate clips are converted to match the track, never the
//!   other way around.

use crate::{Error, Result};
use vmask_common::time::frames_to_sec;

/// Sample rate and channel layout of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

/// In-memory PCM audio
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    spec: SampleSpec,
}

impl AudioBuffer {
    /// Create a buffer, validating that the sample count is a whole number of
    /// frames
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if channels == 0 {
            return Err(Error::FormatConversion("Channel count must be nonzero".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(Error::FormatConversion(format!(
                "Sample count {} is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            spec: SampleSpec { sample_rate, channels },
        })
    }

    /// Internal constructor for samples already known to be frame-aligned
    pub(crate) fn from_parts(samples: Vec<f32>, spec: SampleSpec) -> Self {
        debug_assert_eq!(samples.len() % spec.channels as usize, 0);
        Self { samples, spec }
    }

    /// All-zero buffer of the given length
    pub fn silence(frames: usize, spec: SampleSpec) -> Self {
        Self {
            samples: vec![0.0; frames * spec.channels as usize],
            spec,
        }
    }

    pub fn spec(&self) -> SampleSpec {
        self.spec
    }

    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.spec.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.spec.channels as usize
    }

    pub fn duration_sec(&self) -> f64 {
        frames_to_sec(self.frames(), self.spec.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copy of the frame range `[start, end)`, clamped to the buffer length
    pub fn slice_frames(&self, start: usize, end: usize) -> AudioBuffer {
        let ch = self.spec.channels as usize;
        let total = self.frames();
        let start = start.min(total);
        let end = end.clamp(start, total);
        Self {
            samples: self.samples[start * ch..end * ch].to_vec(),
            spec: self.spec,
        }
    }

    /// Append another buffer with an identical spec
    pub fn append(&mut self, other: &AudioBuffer) -> Result<()> {
        if other.spec != self.spec {
            return Err(Error::FormatConversion(format!(
                "Cannot append {}Hz/{}ch audio to {}Hz/{}ch buffer",
                other.spec.sample_rate,
                other.spec.channels,
                self.spec.sample_rate,
                self.spec.channels
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Shorten the buffer to at most `frames` frames
    pub fn truncate_frames(&mut self, frames: usize) {
        let ch = self.spec.channels as usize;
        self.samples.truncate(frames * ch);
    }

    /// Append `frames` frames of silence
    pub fn extend_silence(&mut self, frames: usize) {
        let ch = self.spec.channels as usize;
        self.samples.extend(std::iter::repeat(0.0).take(frames * ch));
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_frame_alignment() {
        assert!(AudioBuffer::new(vec![0.0; 4], 44100, 2).is_ok());
        assert!(AudioBuffer::new(vec![0.0; 3], 44100, 2).is_err());
        assert!(AudioBuffer::new(vec![0.0; 3], 44100, 0).is_err());
    }

    #[test]
    fn test_frames_and_duration() {
        let buf = AudioBuffer::new(vec![0.0; 88200], 44100, 2).unwrap();
        assert_eq!(buf.frames(), 44100);
        assert!((buf.duration_sec() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_frames() {
        let samples = vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let buf = AudioBuffer::new(samples, 44100, 2).unwrap();

        let middle = buf.slice_frames(1, 2);
        assert_eq!(middle.samples(), &[2.0, 2.0]);

        // Out-of-range slices clamp instead of panicking
        let clamped = buf.slice_frames(2, 10);
        assert_eq!(clamped.samples(), &[3.0, 3.0]);
        let empty = buf.slice_frames(10, 20);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_append_requires_matching_spec() {
        let mut a = AudioBuffer::new(vec![1.0, 1.0], 44100, 2).unwrap();
        let b = AudioBuffer::new(vec![2.0, 2.0], 44100, 2).unwrap();
        let c = AudioBuffer::new(vec![3.0], 48000, 1).unwrap();

        a.append(&b).unwrap();
        assert_eq!(a.frames(), 2);
        assert!(a.append(&c).is_err());
    }

    #[test]
    fn test_silence() {
        let spec = SampleSpec { sample_rate: 48000, channels: 1 };
        let buf = AudioBuffer::silence(480, spec);
        assert_eq!(buf.frames(), 480);
        assert!(buf.samples().iter().all(|&s| s == 0.0));
    }
}
