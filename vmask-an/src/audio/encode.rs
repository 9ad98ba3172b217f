//! WAV output encoding
//!
//! The anonymized track is written as 16-bit PCM WAV regardless of the input
//! container. Float samples are clamped before quantization so a hot surrogate
//! clip cannot wrap around.

use crate::audio::types::AudioBuffer;
use crate::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

/// Write a buffer to disk as 16-bit PCM WAV
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| Error::Encode(format!("Cannot create {}: {}", path.display(), e)))?;

    for &sample in buffer.samples() {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(quantized)
            .map_err(|e| Error::Encode(format!("Write failed for {}: {}", path.display(), e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::Encode(format!("Finalize failed for {}: {}", path.display(), e)))?;

    debug!("Wrote {} frames to {}", buffer.frames(), path.display());
    Ok(())
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wav_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");

        let samples: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin() * 0.5)
            .flat_map(|s| [s, s])
            .collect();
        let buffer = AudioBuffer::new(samples, 44100, 2).unwrap();

        write_wav(&buffer, &path).unwrap();

        let decoded = crate::audio::decode::decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 44100);
        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.frames(), 4410);
    }

    #[test]
    fn test_out_of_range_samples_clamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipped.wav");

        let buffer = AudioBuffer::new(vec![2.0, -2.0, 0.0, 0.0], 44100, 2).unwrap();
        write_wav(&buffer, &path).unwrap();

        let decoded = crate::audio::decode::decode_file(&path).unwrap();
        assert!(decoded.samples()[0] <= 1.0);
        assert!(decoded.samples()[1] >= -1.0);
    }
}
