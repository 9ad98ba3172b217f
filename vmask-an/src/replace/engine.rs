//! Replacement pipeline orchestration
//!
//! One anonymization pass is: normalize the annotation batch, resolve a
//! surrogate for each surviving segment, render every replacement buffer, and
//! stitch the output track. Rendering is embarrassingly parallel: resolution
//! is a pure lookup into the shared read-only inventory and each rendered
//! buffer is independent, so segments go through a rayon pool. The stitch is
//! a strictly ordered single-writer pass at the end.

use crate::annotation::{Annotation, AnnotationSet, Gender, PiiCategory, RowError};
use crate::audio::types::AudioBuffer;
use crate::replace::replacer::{render_segment, Strategy};
use crate::replace::stitcher::{assemble, ExecutedPlan};
use crate::surrogate::{resolve, Inventory};
use crate::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Per-segment audit entry for one replacement
#[derive(Debug, Clone, Serialize)]
pub struct SurrogateUsage {
    pub start_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
    pub gender: Gender,
    pub category: PiiCategory,
    pub language: String,
    pub clip_id: Option<String>,
    pub clip_path: Option<PathBuf>,
    pub clip_duration_sec: Option<f64>,
    pub placeholder: bool,
    pub strategy: Strategy,
}

/// Result of one anonymization pass
#[derive(Debug)]
pub struct ReplacementOutcome {
    pub audio: AudioBuffer,
    /// One entry per replaced segment, in track order
    pub usage: Vec<SurrogateUsage>,
    /// Input rows rejected during normalization
    pub row_errors: Vec<RowError>,
}

/// Stateless engine binding the surrogate inventory to the replacement pass.
///
/// The inventory snapshot is read-only for the engine's lifetime; concurrent
/// requests share it safely.
pub struct ReplacementEngine {
    inventory: Arc<Inventory>,
}

impl ReplacementEngine {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Replace every annotated span of `audio` with surrogate audio.
    ///
    /// Bad annotation rows are reported, not fatal; segments whose clip fails
    /// to load degrade to placeholders. The only error path is an internal
    /// stitching invariant violation.
    pub fn anonymize(
        &self,
        audio: &AudioBuffer,
        raw_annotations: Vec<Annotation>,
        strategy: Strategy,
    ) -> Result<ReplacementOutcome> {
        let (set, row_errors) = AnnotationSet::normalize(raw_annotations);
        info!(
            "Anonymizing {} segments ({} rows rejected), strategy={}",
            set.len(),
            row_errors.len(),
            strategy
        );

        let spec = audio.spec();
        let plans: Vec<ExecutedPlan> = set
            .entries()
            .par_iter()
            .map(|annotation| {
                let resolution = resolve(
                    &self.inventory,
                    &annotation.language,
                    annotation.gender,
                    annotation.category,
                );
                let segment = render_segment(annotation, &resolution, spec, strategy);
                ExecutedPlan {
                    annotation: annotation.clone(),
                    segment,
                }
            })
            .collect();

        let usage = plans
            .iter()
            .map(|plan| {
                let ann = &plan.annotation;
                let clip = plan.segment.clip.as_ref();
                SurrogateUsage {
                    start_sec: ann.start_sec,
                    end_sec: ann.end_sec,
                    duration_sec: ann.duration_sec(),
                    gender: ann.gender,
                    category: ann.category,
                    language: ann.language.clone(),
                    clip_id: clip.map(|c| c.id.clone()),
                    clip_path: clip.map(|c| c.path.clone()),
                    clip_duration_sec: clip.map(|c| c.duration_sec),
                    placeholder: plan.segment.placeholder,
                    strategy,
                }
            })
            .collect();

        let output = assemble(audio, &plans)?;

        Ok(ReplacementOutcome {
            audio: output,
            usage,
            row_errors,
        })
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::types::SampleSpec;

    fn ann(start: f64, end: f64) -> Annotation {
        Annotation {
            start_sec: start,
            end_sec: end,
            gender: Gender::Male,
            category: PiiCategory::Person,
            language: "english".to_string(),
        }
    }

    fn track(frames: usize) -> AudioBuffer {
        AudioBuffer::silence(
            frames,
            SampleSpec {
                sample_rate: 8000,
                channels: 1,
            },
        )
    }

    #[test]
    fn test_no_annotations_is_identity() {
        let engine = ReplacementEngine::new(Arc::new(Inventory::default()));
        let audio = track(16000);

        let outcome = engine.anonymize(&audio, vec![], Strategy::Fit).unwrap();

        assert_eq!(outcome.audio.samples(), audio.samples());
        assert!(outcome.usage.is_empty());
        assert!(outcome.row_errors.is_empty());
    }

    #[test]
    fn test_empty_inventory_yields_placeholder_usage() {
        let engine = ReplacementEngine::new(Arc::new(Inventory::default()));
        let audio = track(16000); // 2 seconds at 8 kHz

        let outcome = engine
            .anonymize(&audio, vec![ann(0.5, 1.0)], Strategy::Fit)
            .unwrap();

        assert_eq!(outcome.usage.len(), 1);
        assert!(outcome.usage[0].placeholder);
        assert!(outcome.usage[0].clip_id.is_none());
        // Fit preserves total duration even for placeholders
        assert_eq!(outcome.audio.frames(), 16000);
    }

    #[test]
    fn test_bad_rows_reported_good_rows_processed() {
        let engine = ReplacementEngine::new(Arc::new(Inventory::default()));
        let audio = track(16000);

        let outcome = engine
            .anonymize(
                &audio,
                vec![ann(1.5, 0.5), ann(0.25, 0.75)],
                Strategy::Fit,
            )
            .unwrap();

        assert_eq!(outcome.row_errors.len(), 1);
        assert_eq!(outcome.row_errors[0].index, 0);
        assert_eq!(outcome.usage.len(), 1);
    }

    #[test]
    fn test_overlapping_annotations_merge_to_one_segment() {
        let engine = ReplacementEngine::new(Arc::new(Inventory::default()));
        let audio = track(24000); // 3 seconds

        let outcome = engine
            .anonymize(
                &audio,
                vec![ann(0.5, 1.2), ann(1.0, 1.8)],
                Strategy::Fit,
            )
            .unwrap();

        assert_eq!(outcome.usage.len(), 1);
        assert_eq!(outcome.usage[0].start_sec, 0.5);
        assert_eq!(outcome.usage[0].end_sec, 1.8);
    }
}
