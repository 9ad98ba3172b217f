//! Agreement comparison engine
//!
//! Given two normalized annotation sets over the same recording, matches
//! corresponding segments by time overlap and classifies how closely the
//! sessions concur. Matching is greedy one-to-one: each annotation of the
//! first session, in start order, claims the unclaimed annotation of the
//! second with the greatest overlap at or above the threshold. Greedy
//! matching can be order-dependent when several annotations cluster in the
//! same region; iterating in start order keeps the outcome deterministic for
//! identical inputs.

use crate::annotation::{Gender, PiiCategory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum overlap percent for two annotations to count as the same segment
pub const MATCH_THRESHOLD_PERCENT: f64 = 20.0;

/// How closely two sessions' annotations of one segment concur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    /// Gender, category and resolved clip all match
    Complete,
    /// Gender and category match, clip identity differs
    Partial,
    /// Gender or category differ
    None,
}

impl AgreementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementLevel::Complete => "complete",
            AgreementLevel::Partial => "partial",
            AgreementLevel::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete" => Some(AgreementLevel::Complete),
            "partial" => Some(AgreementLevel::Partial),
            "none" => Some(AgreementLevel::None),
            _ => None,
        }
    }
}

impl fmt::Display for AgreementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One annotation as the comparison sees it: range, attributes, and the clip
/// it resolved to (if the set came from a processing run)
#[derive(Debug, Clone)]
pub struct ComparableAnnotation {
    pub start_sec: f64,
    pub end_sec: f64,
    pub gender: Gender,
    pub category: PiiCategory,
    pub clip_id: Option<String>,
}

/// All annotations from one session over one recording, sorted by start
#[derive(Debug, Clone)]
pub struct SessionAnnotations {
    pub session_id: String,
    pub entries: Vec<ComparableAnnotation>,
}

/// One matched pair of annotations across two sessions.
///
/// The segment range is the union of the two matched ranges; together with
/// the session pair it forms the record's natural dedupe key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementRecord {
    pub segment_start_sec: f64,
    pub segment_end_sec: f64,
    pub session_a: String,
    pub session_b: String,
    pub gender_a: Gender,
    pub gender_b: Gender,
    pub category_a: PiiCategory,
    pub category_b: PiiCategory,
    pub clip_a: Option<String>,
    pub clip_b: Option<String>,
    pub overlap_percent: f64,
    pub level: AgreementLevel,
}

/// Aggregate agreement metrics for one session pair
#[derive(Debug, Clone, Serialize)]
pub struct PairMetrics {
    pub session_a: String,
    pub session_b: String,
    pub a_segments: usize,
    pub b_segments: usize,
    pub matched: usize,
    /// Segments only session A marked (PII session B may have missed)
    pub a_only: usize,
    /// Segments only session B marked
    pub b_only: usize,
    /// Fraction of matched pairs agreeing on gender (0..1)
    pub gender_agreement: f64,
    /// Fraction of matched pairs agreeing on category (0..1)
    pub category_agreement: f64,
    pub mean_overlap_percent: f64,
    pub mean_start_deviation_sec: f64,
    pub mean_end_deviation_sec: f64,
}

/// Result of comparing two sessions
#[derive(Debug, Clone)]
pub struct Comparison {
    pub records: Vec<AgreementRecord>,
    pub metrics: PairMetrics,
}

/// Time overlap of two ranges as a percentage of their union
pub fn overlap_percent(a: (f64, f64), b: (f64, f64)) -> f64 {
    let intersection = (a.1.min(b.1) - a.0.max(b.0)).max(0.0);
    let union = a.1.max(b.1) - a.0.min(b.0);
    if union > 0.0 {
        100.0 * intersection / union
    } else {
        0.0
    }
}

fn classify(a: &ComparableAnnotation, b: &ComparableAnnotation) -> AgreementLevel {
    if a.gender != b.gender || a.category != b.category {
        return AgreementLevel::None;
    }
    if a.clip_id == b.clip_id {
        AgreementLevel::Complete
    } else {
        AgreementLevel::Partial
    }
}

/// Compare two sessions' annotations of the same recording.
///
/// Pure and deterministic: the same inputs always yield the same records, so
/// persisting through a keyed insert-or-skip makes recomputation idempotent.
pub fn compare(a: &SessionAnnotations, b: &SessionAnnotations) -> Comparison {
    let mut claimed = vec![false; b.entries.len()];
    let mut records = Vec::new();
    let mut start_deviation_sum = 0.0;
    let mut end_deviation_sum = 0.0;

    for ann_a in &a.entries {
        let mut best: Option<(usize, f64)> = None;

        for (j, ann_b) in b.entries.iter().enumerate() {
            if claimed[j] {
                continue;
            }
            let pct = overlap_percent(
                (ann_a.start_sec, ann_a.end_sec),
                (ann_b.start_sec, ann_b.end_sec),
            );
            if pct < MATCH_THRESHOLD_PERCENT {
                continue;
            }
            if best.map_or(true, |(_, best_pct)| pct > best_pct) {
                best = Some((j, pct));
            }
        }

        if let Some((j, pct)) = best {
            claimed[j] = true;
            let ann_b = &b.entries[j];

            start_deviation_sum += (ann_a.start_sec - ann_b.start_sec).abs();
            end_deviation_sum += (ann_a.end_sec - ann_b.end_sec).abs();

            records.push(AgreementRecord {
                segment_start_sec: ann_a.start_sec.min(ann_b.start_sec),
                segment_end_sec: ann_a.end_sec.max(ann_b.end_sec),
                session_a: a.session_id.clone(),
                session_b: b.session_id.clone(),
                gender_a: ann_a.gender,
                gender_b: ann_b.gender,
                category_a: ann_a.category,
                category_b: ann_b.category,
                clip_a: ann_a.clip_id.clone(),
                clip_b: ann_b.clip_id.clone(),
                overlap_percent: pct,
                level: classify(ann_a, ann_b),
            });
        }
    }

    let matched = records.len();
    let ratio = |n: usize| if matched > 0 { n as f64 / matched as f64 } else { 0.0 };
    let mean = |sum: f64| if matched > 0 { sum / matched as f64 } else { 0.0 };

    let gender_matches = records.iter().filter(|r| r.gender_a == r.gender_b).count();
    let category_matches = records
        .iter()
        .filter(|r| r.category_a == r.category_b)
        .count();
    let overlap_sum: f64 = records.iter().map(|r| r.overlap_percent).sum();

    let metrics = PairMetrics {
        session_a: a.session_id.clone(),
        session_b: b.session_id.clone(),
        a_segments: a.entries.len(),
        b_segments: b.entries.len(),
        matched,
        a_only: a.entries.len() - matched,
        b_only: b.entries.len() - matched,
        gender_agreement: ratio(gender_matches),
        category_agreement: ratio(category_matches),
        mean_overlap_percent: mean(overlap_sum),
        mean_start_deviation_sec: mean(start_deviation_sum),
        mean_end_deviation_sec: mean(end_deviation_sum),
    };

    Comparison { records, metrics }
}

// ========================================
// Tests
// ========================================
