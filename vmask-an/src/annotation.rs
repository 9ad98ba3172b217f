//! Annotation validation and normalization
//!
//! Raw annotation batches arrive as loosely ordered time ranges marked up by a
//! human session. Before any audio work happens they are validated per row,
//! sorted, and merged into a disjoint sequence. Rejected rows never abort the
//! batch: the caller gets the surviving set plus one error per bad row.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Speaker gender attached to an annotated range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of personally-identifying content an annotation marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Person,
    UserId,
    Location,
    Other,
}

impl PiiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::Person => "person",
            PiiCategory::UserId => "user_id",
            PiiCategory::Location => "location",
            PiiCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "person" => Some(PiiCategory::Person),
            "user_id" => Some(PiiCategory::UserId),
            "location" => Some(PiiCategory::Location),
            "other" => Some(PiiCategory::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two ranges closer than this merge into one. Touching ranges always merge.
pub const MERGE_TOLERANCE_SEC: f64 = 0.0;

/// A labeled time range marking a PII span in a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub start_sec: f64,
    pub end_sec: f64,
    pub gender: Gender,
    pub category: PiiCategory,
    pub language: String,
}

impl Annotation {
    pub fn duration_sec(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !self.start_sec.is_finite() || !self.end_sec.is_finite() {
            return Err("start and end must be finite numbers".to_string());
        }
        if self.start_sec < 0.0 {
            return Err(format!("start {:.3}s is negative", self.start_sec));
        }
        if self.end_sec <= self.start_sec {
            return Err(format!(
                "end {:.3}s must be after start {:.3}s",
                self.end_sec, self.start_sec
            ));
        }
        Ok(())
    }
}

/// Validation outcome for one rejected input row
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// Index of the row in the submitted batch
    pub index: usize,
    pub reason: String,
}

/// A merge block under construction: the union range plus the entry currently
/// donating attributes to it
struct MergeBlock {
    start_sec: f64,
    end_sec: f64,
    dominant: Annotation,
}

/// Normalized annotation sequence: sorted by start, pairwise disjoint
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    entries: Vec<Annotation>,
}

impl AnnotationSet {
    /// Validate, sort and merge a raw annotation batch.
    ///
    /// Rows with non-finite bounds, a negative start, or `end <= start` are
    /// rejected individually; the rest of the batch is still processed.
    /// Overlapping or touching ranges merge into one entry spanning their
    /// union. When merged entries disagree on gender/category/language, the
    /// entry with the larger duration donates its attributes; ties go to the
    /// earlier start.
    pub fn normalize(raw: Vec<Annotation>) -> (Self, Vec<RowError>) {
        let mut errors = Vec::new();
        let mut valid = Vec::new();

        for (index, ann) in raw.into_iter().enumerate() {
            match ann.validate() {
                Ok(()) => valid.push(ann),
                Err(reason) => {
                    warn!("Rejected annotation row {}: {}", index, reason);
                    errors.push(RowError { index, reason });
                }
            }
        }

        valid.sort_by(|a, b| {
            a.start_sec
                .total_cmp(&b.start_sec)
                .then(a.end_sec.total_cmp(&b.end_sec))
        });

        let mut blocks: Vec<MergeBlock> = Vec::new();
        for ann in valid {
            if let Some(last) = blocks.last_mut() {
                if ann.start_sec <= last.end_sec + MERGE_TOLERANCE_SEC {
                    last.end_sec = last.end_sec.max(ann.end_sec);
                    if dominates(&ann, &last.dominant) {
                        last.dominant = ann;
                    }
                    continue;
                }
            }
            blocks.push(MergeBlock {
                start_sec: ann.start_sec,
                end_sec: ann.end_sec,
                dominant: ann,
            });
        }

        let entries = blocks
            .into_iter()
            .map(|b| Annotation {
                start_sec: b.start_sec,
                end_sec: b.end_sec,
                gender: b.dominant.gender,
                category: b.dominant.category,
                language: b.dominant.language,
            })
            .collect();

        (Self { entries }, errors)
    }

    /// Build a set from entries already known to be sorted and disjoint
    /// (e.g. rows loaded back from the database)
    pub fn from_normalized(entries: Vec<Annotation>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Annotation] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Annotation> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total annotated time across all entries
    pub fn total_coverage_sec(&self) -> f64 {
        self.entries.iter().map(|a| a.duration_sec()).sum()
    }
}

/// Attribute donor rule for a merged range: the longer entry wins, ties go to
/// the earlier start. Inputs arrive in start order, so an equal-duration later
/// entry never displaces the incumbent.
fn dominates(candidate: &Annotation, incumbent: &Annotation) -> bool {
    let cd = candidate.duration_sec();
    let id = incumbent.duration_sec();
    cd > id || (cd == id && candidate.start_sec < incumbent.start_sec)
}

// ========================================
// Tests
// ========================================
