//! Audio buffer handling
//!
//! Decode, encode, format conversion and placeholder synthesis. Everything
//! downstream of decode works on interleaved f32 PCM at the source track's
//! native sample rate and channel count.

pub mod convert;
pub mod decode;
pub mod encode;
pub mod placeholder;
pub mod types;

pub use types::{AudioBuffer, SampleSpec};
