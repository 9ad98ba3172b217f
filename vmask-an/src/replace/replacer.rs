//! Per-segment replacement synthesis
//!
//! Turns one resolved annotation into the audio that will stand in for it.
//! Two strategies:
//!
//! - **Direct**: the clip is inserted at its native duration; the output
//!   track length shifts by the difference between clip and span.
//! - **Fit**: the clip is trimmed (anchored at its start) or padded with
//!   trailing silence to exactly the annotated span, then a short cosine
//!   fade-in/out is applied at both edges to prevent audible clicks.
//!
//! A clip that cannot be decoded or converted to the track's format degrades
//! to a placeholder tone. Segment synthesis never fails a request.

use crate::annotation::Annotation;
use crate::audio::types::{AudioBuffer, SampleSpec};
use crate::audio::{convert, decode, placeholder};
use crate::surrogate::inventory::SurrogateClip;
use crate::surrogate::Resolution;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use vmask_common::time::sec_to_frames;

/// Replacement strategy for annotated spans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Insert the clip at its native duration
    #[default]
    Direct,
    /// Trim or pad the clip to exactly the annotated span
    Fit,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Fit => "fit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(Strategy::Direct),
            "fit" => Some(Strategy::Fit),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge fade length for fit-strategy segments, clamped to half the segment
pub const EDGE_FADE_SEC: f64 = 0.030;

/// One synthesized replacement segment
#[derive(Debug)]
pub struct RenderedSegment {
    pub audio: AudioBuffer,
    /// The clip that produced the audio, absent for placeholder segments
    pub clip: Option<SurrogateClip>,
    pub placeholder: bool,
}

/// Number of frames the annotated span occupies at the track's rate.
///
/// Computed from the rounded start and end frames, not the rounded duration,
/// so it always equals the hole the stitcher cuts out of the original.
pub fn annotated_frames(annotation: &Annotation, sample_rate: u32) -> usize {
    let start = sec_to_frames(annotation.start_sec, sample_rate);
    let end = sec_to_frames(annotation.end_sec, sample_rate);
    end.saturating_sub(start)
}

/// Synthesize the replacement audio for one annotation
pub fn render_segment(
    annotation: &Annotation,
    resolution: &Resolution,
    target: SampleSpec,
    strategy: Strategy,
) -> RenderedSegment {
    let (base, clip, is_placeholder) = match resolution {
        Resolution::Placeholder => (placeholder_audio(annotation, target), None, true),
        Resolution::Clip(clip) => match load_converted(clip, target) {
            Some(audio) => (audio, Some(clip.clone()), false),
            None => (placeholder_audio(annotation, target), None, true),
        },
    };

    let audio = match strategy {
        Strategy::Direct => base,
        Strategy::Fit => {
            let mut fitted = fit_to_frames(base, annotated_frames(annotation, target.sample_rate));
            apply_edge_fades(&mut fitted);
            fitted
        }
    };

    RenderedSegment {
        audio,
        clip,
        placeholder: is_placeholder,
    }
}

/// Decode a clip and convert it to the track's format.
///
/// Returns None on any failure; the caller substitutes a placeholder.
fn load_converted(clip: &SurrogateClip, target: SampleSpec) -> Option<AudioBuffer> {
    let decoded = match decode::decode_file(&clip.path) {
        Ok(audio) => audio,
        Err(e) => {
            warn!(
                "Cannot decode surrogate clip {}: {}; substituting placeholder",
                clip.path.display(),
                e
            );
            return None;
        }
    };

    match convert::convert_to_spec(&decoded, target) {
        Ok(audio) => Some(audio),
        Err(e) => {
            warn!(
                "Cannot convert surrogate clip {} to track format: {}; substituting placeholder",
                clip.id, e
            );
            None
        }
    }
}

/// Placeholder audio spanning exactly the annotated range.
///
/// Placeholder duration equals the span under both strategies, so a missing
/// clip never shifts the output track.
fn placeholder_audio(annotation: &Annotation, target: SampleSpec) -> AudioBuffer {
    placeholder::generate_frames(annotated_frames(annotation, target.sample_rate), target)
}

/// Trim (anchored at the clip start) or pad with trailing silence to an exact
/// frame count
fn fit_to_frames(mut audio: AudioBuffer, frames: usize) -> AudioBuffer {
    if audio.frames() > frames {
        audio.truncate_frames(frames);
    } else if audio.frames() < frames {
        let missing = frames - audio.frames();
        audio.extend_silence(missing);
    }
    audio
}

/// Apply a cosine fade-in and fade-out at the segment edges.
///
/// The fade window clamps to half the segment so the two ramps never overlap.
fn apply_edge_fades(audio: &mut AudioBuffer) {
    let frames = audio.frames();
    let fade_frames = sec_to_frames(EDGE_FADE_SEC, audio.sample_rate()).min(frames / 2);
    if fade_frames == 0 {
        return;
    }

    let channels = audio.channels() as usize;
    let samples = audio.samples_mut();

    for i in 0..fade_frames {
        let gain = cosine_gain(i as f64 / fade_frames as f64) as f32;
        let tail = frames - 1 - i;
        for ch in 0..channels {
            samples[i * channels + ch] *= gain;
            samples[tail * channels + ch] *= gain;
        }
    }
}

/// Cosine S-curve: y = (1 - cos(πx)) / 2
fn cosine_gain(progress: f64) -> f64 {
    (1.0 - (std::f64::consts::PI * progress).cos()) / 2.0
}

// ========================================
// Tests
// ========================================
