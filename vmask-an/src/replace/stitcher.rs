//! Output track assembly
//!
//! Alternates spans of the original track with rendered replacement segments:
//! `original[0..p1.start] + r1 + original[p1.end..p2.start] + r2 + ... + tail`.
//! The assembly is a strictly ordered, single-writer pass over the sorted plan
//! list; rendering may have happened in parallel, stitching never does.

use crate::annotation::Annotation;
use crate::audio::types::AudioBuffer;
use crate::replace::replacer::RenderedSegment;
use crate::{Error, Result};
use vmask_common::time::sec_to_frames;

/// One annotation with its synthesized replacement audio, ready to stitch
#[derive(Debug)]
pub struct ExecutedPlan {
    pub annotation: Annotation,
    pub segment: RenderedSegment,
}

/// Assemble the output track.
///
/// Plans must be sorted by start and non-overlapping; annotation
/// normalization guarantees both. With an empty plan list the output is a
/// sample-identical copy of the input.
pub fn assemble(original: &AudioBuffer, plans: &[ExecutedPlan]) -> Result<AudioBuffer> {
    let rate = original.sample_rate();
    let total_frames = original.frames();

    let mut output = AudioBuffer::silence(0, original.spec());
    let mut cursor = 0usize;
    let mut last_end_sec = 0.0f64;

    for plan in plans {
        let ann = &plan.annotation;
        if ann.start_sec < last_end_sec {
            return Err(Error::InvalidAnnotation(format!(
                "Replacement plans out of order at {:.3}s",
                ann.start_sec
            )));
        }
        last_end_sec = ann.end_sec;

        if plan.segment.audio.spec() != original.spec() {
            return Err(Error::Internal(format!(
                "Rendered segment at {:.3}s does not match track format",
                ann.start_sec
            )));
        }

        let start_frame = sec_to_frames(ann.start_sec, rate).min(total_frames);
        let end_frame = sec_to_frames(ann.end_sec, rate).clamp(start_frame, total_frames);

        output.append(&original.slice_frames(cursor, start_frame))?;
        output.append(&plan.segment.audio)?;
        cursor = end_frame;
    }

    // Tail of the original after the last replacement
    output.append(&original.slice_frames(cursor, total_frames))?;

    Ok(output)
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Gender, PiiCategory};
    use crate::audio::types::SampleSpec;

    const SPEC: SampleSpec = SampleSpec {
        sample_rate: 1000,
        channels: 1,
    };

    fn ann(start: f64, end: f64) -> Annotation {
        Annotation {
            start_sec: start,
            end_sec: end,
            gender: Gender::Female,
            category: PiiCategory::Person,
            language: "english".to_string(),
        }
    }

    fn plan(start: f64, end: f64, fill: f32, frames: usize) -> ExecutedPlan {
        ExecutedPlan {
            annotation: ann(start, end),
            segment: RenderedSegment {
                audio: AudioBuffer::new(vec![fill; frames], SPEC.sample_rate, SPEC.channels)
                    .unwrap(),
                clip: None,
                placeholder: true,
            },
        }
    }

    fn ramp_track(frames: usize) -> AudioBuffer {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        AudioBuffer::new(samples, SPEC.sample_rate, SPEC.channels).unwrap()
    }

    #[test]
    fn test_empty_plan_list_is_identity() {
        let original = ramp_track(5000);
        let output = assemble(&original, &[]).unwrap();
        assert_eq!(output.samples(), original.samples());
    }

    #[test]
    fn test_replacement_lands_between_original_spans() {
        let original = ramp_track(5000); // 5 seconds at 1kHz
        let plans = vec![plan(1.0, 2.0, -1.0, 1000)];

        let output = assemble(&original, &plans).unwrap();

        assert_eq!(output.frames(), 5000);
        assert_eq!(output.samples()[999], 999.0); // original before the span
        assert_eq!(output.samples()[1000], -1.0); // replacement start
        assert_eq!(output.samples()[1999], -1.0); // replacement end
        assert_eq!(output.samples()[2000], 2000.0); // original resumes
    }

    #[test]
    fn test_duration_shift_with_mismatched_segment() {
        let original = ramp_track(5000);
        // 1 s annotated span replaced by a 1.5 s segment (direct-style)
        let plans = vec![plan(1.0, 2.0, -1.0, 1500)];

        let output = assemble(&original, &plans).unwrap();
        assert_eq!(output.frames(), 5500);
    }

    #[test]
    fn test_multiple_plans_in_order() {
        let original = ramp_track(6000);
        let plans = vec![plan(0.5, 1.0, -1.0, 500), plan(4.0, 5.0, -2.0, 1000)];

        let output = assemble(&original, &plans).unwrap();

        assert_eq!(output.frames(), 6000);
        assert_eq!(output.samples()[500], -1.0);
        assert_eq!(output.samples()[4000], -2.0);
        assert_eq!(output.samples()[5999], 5999.0);
    }

    #[test]
    fn test_out_of_order_plans_rejected() {
        let original = ramp_track(5000);
        let plans = vec![plan(2.0, 3.0, -1.0, 1000), plan(1.0, 1.5, -2.0, 500)];

        assert!(assemble(&original, &plans).is_err());
    }

    #[test]
    fn test_span_past_track_end_clamps() {
        let original = ramp_track(2000);
        // Annotation runs past the end of the track
        let plans = vec![plan(1.5, 3.0, -1.0, 1500)];

        let output = assemble(&original, &plans).unwrap();
        // 1.5 s of original + full replacement, no tail
        assert_eq!(output.frames(), 3000);
        assert_eq!(output.samples()[1499], 1499.0);
        assert_eq!(output.samples()[1500], -1.0);
    }

    #[test]
    fn test_format_mismatch_rejected() {
        let original = ramp_track(2000);
        let bad = ExecutedPlan {
            annotation: ann(0.5, 1.0),
            segment: RenderedSegment {
                audio: AudioBuffer::new(vec![0.0; 100], 8000, 1).unwrap(),
                clip: None,
                placeholder: true,
            },
        };

        assert!(assemble(&original, &[bad]).is_err());
    }
}
