//! Database models
//!
//! Gender, category and language values are stored as plain lowercase strings.
//! The service layer owns the typed vocabulary and re-validates rows when it
//! loads them back; a row that no longer parses is skipped there, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One annotation session over one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationSetRecord {
    pub guid: Uuid,
    pub session_id: String,
    pub audio_fingerprint: String,
    pub original_filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One normalized annotation row belonging to a set
///
/// `clip_id` is the surrogate clip the replacement engine resolved for this
/// range, when the set was stored as part of a processing run. Sets stored
/// without processing carry no clip identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub guid: Uuid,
    pub set_guid: Uuid,
    pub start_sec: f64,
    pub end_sec: f64,
    pub gender: String,
    pub category: String,
    pub language: String,
    pub clip_id: Option<String>,
}

/// Processing job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// Record of one anonymization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub guid: Uuid,
    pub session_id: String,
    pub audio_fingerprint: String,
    pub original_filename: Option<String>,
    pub strategy: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub input_duration_sec: Option<f64>,
    pub output_duration_sec: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Audit row for one replaced segment: which clip went where, and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateUsageRecord {
    pub job_guid: Uuid,
    pub start_sec: f64,
    pub end_sec: f64,
    pub duration_sec: f64,
    pub gender: String,
    pub category: String,
    pub language: String,
    pub clip_id: Option<String>,
    pub clip_path: Option<String>,
    pub clip_duration_sec: Option<f64>,
    pub strategy: String,
    pub placeholder: bool,
}

/// One persisted agreement comparison between two sessions.
///
/// The natural key is `(audio_fingerprint, session_a, session_b,
/// segment_start_sec, segment_end_sec)`; inserts are idempotent on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAgreementRecord {
    pub audio_fingerprint: String,
    pub session_a: String,
    pub session_b: String,
    pub segment_start_sec: f64,
    pub segment_end_sec: f64,
    pub gender_a: String,
    pub gender_b: String,
    pub category_a: String,
    pub category_b: String,
    pub clip_a: Option<String>,
    pub clip_b: Option<String>,
    pub overlap_percent: f64,
    pub level: String,
}

/// Aggregate agreement statistics for one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementSummary {
    pub total_comparisons: i64,
    pub complete: i64,
    pub partial: i64,
    pub none: i64,
    pub complete_percent: f64,
    pub partial_percent: f64,
    pub none_percent: f64,
    pub avg_overlap_percent: f64,
}
