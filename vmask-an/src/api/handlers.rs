//! HTTP request handlers
//!
//! Implements the REST endpoints for anonymization, annotation set storage,
//! and agreement reporting. The audio pipeline runs on the blocking pool; the
//! handlers own the job bookkeeping around it.

use crate::annotation::{Annotation, Gender, PiiCategory, RowError};
use crate::api::server::AppContext;
use crate::audio::{decode, encode};
use crate::replace::{ReplacementOutcome, Strategy, SurrogateUsage};
use crate::{agreement, Error, Result};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info, warn};
use uuid::Uuid;
use vmask_common::db::models::{
    AgreementSummary, AnnotationRecord, AnnotationSetRecord, JobStatus, ProcessingJob,
    StoredAgreementRecord, SurrogateUsageRecord,
};
use vmask_common::db::{agreement as agreement_db, annotation_sets, jobs};
use vmask_common::fingerprint;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotationPayload {
    pub start_sec: f64,
    pub end_sec: f64,
    pub gender: Gender,
    pub category: PiiCategory,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "english".to_string()
}

impl From<&AnnotationPayload> for Annotation {
    fn from(payload: &AnnotationPayload) -> Self {
        Annotation {
            start_sec: payload.start_sec,
            end_sec: payload.end_sec,
            gender: payload.gender,
            category: payload.category,
            language: payload.language.to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnonymizeRequest {
    pub file_path: String,
    pub session_id: String,
    #[serde(default)]
    pub strategy: Strategy,
    pub annotations: Vec<AnnotationPayload>,
    /// Defaults to `<input stem>.anonymized.wav` under the service root folder
    pub output_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnonymizeResponse {
    pub job_id: Uuid,
    pub audio_fingerprint: String,
    pub output_path: String,
    pub strategy: Strategy,
    pub input_duration_sec: f64,
    pub output_duration_sec: f64,
    pub segments: Vec<SurrogateUsage>,
    pub rejected_rows: Vec<RowError>,
    pub agreement_records_added: usize,
}

#[derive(Debug, Deserialize)]
pub struct StoreAnnotationsRequest {
    pub session_id: String,
    pub audio_fingerprint: String,
    pub original_filename: Option<String>,
    pub annotations: Vec<AnnotationPayload>,
}

#[derive(Debug, Serialize)]
pub struct StoreAnnotationsResponse {
    pub set_id: Uuid,
    pub stored_segments: usize,
    pub rejected_rows: Vec<RowError>,
    pub agreement_records_added: usize,
}

#[derive(Debug, Serialize)]
pub struct AnnotationSetView {
    pub set_id: Uuid,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub segments: Vec<AnnotationView>,
}

#[derive(Debug, Serialize)]
pub struct AnnotationView {
    pub start_sec: f64,
    pub end_sec: f64,
    pub gender: String,
    pub category: String,
    pub language: String,
    pub clip_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnnotationSetsResponse {
    pub audio_fingerprint: String,
    pub sets: Vec<AnnotationSetView>,
}

#[derive(Debug, Serialize)]
pub struct AgreementRecordsResponse {
    pub audio_fingerprint: String,
    pub records: Vec<StoredAgreementRecord>,
}

#[derive(Debug, Serialize)]
pub struct AgreementSummaryResponse {
    pub audio_fingerprint: String,
    pub summary: AgreementSummary,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "anonymizer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Anonymization
// ============================================================================

/// POST /anonymize - Replace annotated spans of a recording with surrogates
///
/// Decodes the input, runs the replacement engine, writes the output WAV,
/// records the job with its per-segment usage, stores the normalized
/// annotation set, and recomputes agreement when other sessions have already
/// annotated the same recording.
pub async fn anonymize(
    State(ctx): State<AppContext>,
    Json(req): Json<AnonymizeRequest>,
) -> Result<Json<AnonymizeResponse>> {
    let input_path = PathBuf::from(&req.file_path);
    if !input_path.is_file() {
        return Err(Error::NotFound(format!(
            "Input file not found: {}",
            input_path.display()
        )));
    }

    let bytes = tokio::fs::read(&input_path).await?;
    let audio_fingerprint = fingerprint::fingerprint_bytes(&bytes);
    drop(bytes);

    let original_filename = input_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string());

    let job = ProcessingJob {
        guid: Uuid::new_v4(),
        session_id: req.session_id.clone(),
        audio_fingerprint: audio_fingerprint.clone(),
        original_filename: original_filename.clone(),
        strategy: req.strategy.as_str().to_string(),
        status: JobStatus::Processing,
        error_message: None,
        input_duration_sec: None,
        output_duration_sec: None,
        created_at: Utc::now(),
        completed_at: None,
    };
    jobs::insert_job(&ctx.db_pool, &job).await?;

    let output_path = req
        .output_path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(&ctx.config.root_folder, &input_path));

    let annotations: Vec<Annotation> = req.annotations.iter().map(Annotation::from).collect();
    let engine = ctx.engine.clone();
    let strategy = req.strategy;

    // The pipeline is synchronous CPU/IO work; keep it off the async runtime
    let work_input = input_path.clone();
    let work_output = output_path.clone();
    let pipeline = tokio::task::spawn_blocking(move || -> Result<(f64, ReplacementOutcome)> {
        let input = decode::decode_file(&work_input)?;
        let input_duration_sec = input.duration_sec();
        let outcome = engine.anonymize(&input, annotations, strategy)?;
        encode::write_wav(&outcome.audio, &work_output)?;
        Ok((input_duration_sec, outcome))
    })
    .await
    .map_err(|e| Error::Internal(format!("Processing task panicked: {}", e)))?;

    let (input_duration_sec, outcome) = match pipeline {
        Ok(result) => result,
        Err(e) => {
            error!("Anonymization failed for {}: {}", input_path.display(), e);
            if let Err(db_err) = jobs::mark_job_failed(&ctx.db_pool, job.guid, &e.to_string()).await
            {
                warn!("Could not mark job {} failed: {}", job.guid, db_err);
            }
            return Err(e);
        }
    };

    let output_duration_sec = outcome.audio.duration_sec();

    let usage_records: Vec<SurrogateUsageRecord> = outcome
        .usage
        .iter()
        .map(|u| SurrogateUsageRecord {
            job_guid: job.guid,
            start_sec: u.start_sec,
            end_sec: u.end_sec,
            duration_sec: u.duration_sec,
            gender: u.gender.to_string(),
            category: u.category.to_string(),
            language: u.language.clone(),
            clip_id: u.clip_id.clone(),
            clip_path: u.clip_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            clip_duration_sec: u.clip_duration_sec,
            strategy: u.strategy.as_str().to_string(),
            placeholder: u.placeholder,
        })
        .collect();
    jobs::record_surrogate_usage(&ctx.db_pool, &usage_records).await?;
    jobs::mark_job_completed(&ctx.db_pool, job.guid, output_duration_sec).await?;

    // Persist the normalized set with the clips each segment resolved to,
    // then compare against any other sessions on the same recording
    let set = AnnotationSetRecord {
        guid: Uuid::new_v4(),
        session_id: req.session_id.clone(),
        audio_fingerprint: audio_fingerprint.clone(),
        original_filename,
        created_at: Utc::now(),
    };
    let rows = usage_to_annotation_rows(set.guid, &outcome.usage);
    annotation_sets::store_annotation_set(&ctx.db_pool, &set, &rows).await?;

    let agreement_records_added = maybe_recompute(&ctx, &audio_fingerprint).await?;

    info!(
        "Anonymized {} -> {} ({} segments, {} placeholders, strategy={})",
        input_path.display(),
        output_path.display(),
        outcome.usage.len(),
        outcome.usage.iter().filter(|u| u.placeholder).count(),
        strategy
    );

    Ok(Json(AnonymizeResponse {
        job_id: job.guid,
        audio_fingerprint,
        output_path: output_path.to_string_lossy().to_string(),
        strategy,
        input_duration_sec,
        output_duration_sec,
        segments: outcome.usage,
        rejected_rows: outcome.row_errors,
        agreement_records_added,
    }))
}

// ============================================================================
// Annotation Sets
// ============================================================================

/// POST /annotations - Store an annotation set without processing audio
pub async fn store_annotations(
    State(ctx): State<AppContext>,
    Json(req): Json<StoreAnnotationsRequest>,
) -> Result<Json<StoreAnnotationsResponse>> {
    if req.audio_fingerprint.is_empty() {
        return Err(Error::BadRequest("audio_fingerprint must not be empty".to_string()));
    }

    let raw: Vec<Annotation> = req.annotations.iter().map(Annotation::from).collect();
    let (normalized, rejected_rows) = crate::annotation::AnnotationSet::normalize(raw);

    let set = AnnotationSetRecord {
        guid: Uuid::new_v4(),
        session_id: req.session_id.clone(),
        audio_fingerprint: req.audio_fingerprint.clone(),
        original_filename: req.original_filename.clone(),
        created_at: Utc::now(),
    };
    let rows: Vec<AnnotationRecord> = normalized
        .entries()
        .iter()
        .map(|a| AnnotationRecord {
            guid: Uuid::new_v4(),
            set_guid: set.guid,
            start_sec: a.start_sec,
            end_sec: a.end_sec,
            gender: a.gender.to_string(),
            category: a.category.to_string(),
            language: a.language.clone(),
            clip_id: None,
        })
        .collect();
    annotation_sets::store_annotation_set(&ctx.db_pool, &set, &rows).await?;

    let agreement_records_added = maybe_recompute(&ctx, &req.audio_fingerprint).await?;

    info!(
        "Stored annotation set {} ({} segments) for {}",
        set.guid,
        rows.len(),
        req.audio_fingerprint
    );

    Ok(Json(StoreAnnotationsResponse {
        set_id: set.guid,
        stored_segments: rows.len(),
        rejected_rows,
        agreement_records_added,
    }))
}

/// GET /annotations/:fingerprint - All stored sets for a recording
pub async fn list_annotations(
    State(ctx): State<AppContext>,
    Path(fingerprint): Path<String>,
) -> Result<Json<AnnotationSetsResponse>> {
    let stored = annotation_sets::load_annotation_sets(&ctx.db_pool, &fingerprint).await?;

    let sets = stored
        .into_iter()
        .map(|(set, rows)| AnnotationSetView {
            set_id: set.guid,
            session_id: set.session_id,
            created_at: set.created_at,
            segments: rows
                .into_iter()
                .map(|r| AnnotationView {
                    start_sec: r.start_sec,
                    end_sec: r.end_sec,
                    gender: r.gender,
                    category: r.category,
                    language: r.language,
                    clip_id: r.clip_id,
                })
                .collect(),
        })
        .collect();

    Ok(Json(AnnotationSetsResponse {
        audio_fingerprint: fingerprint,
        sets,
    }))
}

// ============================================================================
// Agreement
// ============================================================================

/// GET /agreement/:fingerprint - Stored agreement records for a recording
pub async fn agreement_records(
    State(ctx): State<AppContext>,
    Path(fingerprint): Path<String>,
) -> Result<Json<AgreementRecordsResponse>> {
    let records = agreement_db::load_records(&ctx.db_pool, &fingerprint).await?;
    Ok(Json(AgreementRecordsResponse {
        audio_fingerprint: fingerprint,
        records,
    }))
}

/// GET /agreement/:fingerprint/summary - Aggregate agreement statistics
pub async fn agreement_summary(
    State(ctx): State<AppContext>,
    Path(fingerprint): Path<String>,
) -> Result<Json<AgreementSummaryResponse>> {
    let summary = agreement_db::load_summary(&ctx.db_pool, &fingerprint).await?;
    Ok(Json(AgreementSummaryResponse {
        audio_fingerprint: fingerprint,
        summary,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// `<input stem>.anonymized.wav` under the service root folder
fn default_output_path(root: &std::path::Path, input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    root.join(format!("{}.anonymized.wav", stem))
}

fn usage_to_annotation_rows(set_guid: Uuid, usage: &[SurrogateUsage]) -> Vec<AnnotationRecord> {
    usage
        .iter()
        .map(|u| AnnotationRecord {
            guid: Uuid::new_v4(),
            set_guid,
            start_sec: u.start_sec,
            end_sec: u.end_sec,
            gender: u.gender.to_string(),
            category: u.category.to_string(),
            language: u.language.clone(),
            clip_id: u.clip_id.clone(),
        })
        .collect()
}

/// Run the agreement recompute when at least two sessions have stored sets
/// for the recording
async fn maybe_recompute(ctx: &AppContext, audio_fingerprint: &str) -> Result<usize> {
    let sessions = annotation_sets::count_sessions_for(&ctx.db_pool, audio_fingerprint).await?;
    if sessions < 2 {
        return Ok(0);
    }
    agreement::recompute_for_fingerprint(&ctx.db_pool, audio_fingerprint).await
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let out = default_output_path(
            std::path::Path::new("/data/vmask"),
            std::path::Path::new("/uploads/interview.mp3"),
        );
        assert_eq!(out, PathBuf::from("/data/vmask/interview.anonymized.wav"));
    }

    #[test]
    fn test_annotation_payload_lowercases_language() {
        let payload = AnnotationPayload {
            start_sec: 0.0,
            end_sec: 1.0,
            gender: Gender::Male,
            category: PiiCategory::Person,
            language: "English".to_string(),
        };
        let annotation = Annotation::from(&payload);
        assert_eq!(annotation.language, "english");
    }
}
