//! Shared fixtures for integration tests
#![allow(dead_code)]

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write a sine-wave WAV fixture, creating parent directories as needed
pub fn write_wav(path: &Path, duration_sec: f64, sample_rate: u32, channels: u16, freq_hz: f32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();

    let frames = (duration_sec * sample_rate as f64) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * freq_hz * t).sin() * 0.5;
        let quantized = (sample * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(quantized).unwrap();
        }
    }
    writer.finalize().unwrap();
}
