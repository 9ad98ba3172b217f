//! Processing job persistence
//!
//! Each anonymization run is recorded as a job plus one surrogate usage row
//! per replaced segment, forming the audit trail for which clip went where.

use crate::db::models::{JobStatus, ProcessingJob, SurrogateUsageRecord};
use crate::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert a new job record
pub async fn insert_job(pool: &SqlitePool, job: &ProcessingJob) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO processing_jobs
            (guid, session_id, audio_fingerprint, original_filename, strategy, status,
             error_message, input_duration_sec, output_duration_sec, created_at, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(job.guid.to_string())
    .bind(&job.session_id)
    .bind(&job.audio_fingerprint)
    .bind(&job.original_filename)
    .bind(&job.strategy)
    .bind(job.status.as_str())
    .bind(&job.error_message)
    .bind(job.input_duration_sec)
    .bind(job.output_duration_sec)
    .bind(job.created_at.to_rfc3339())
    .bind(job.completed_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a job completed and record the output duration
pub async fn mark_job_completed(
    pool: &SqlitePool,
    job_guid: Uuid,
    output_duration_sec: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE processing_jobs
        SET status = ?, output_duration_sec = ?, completed_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(JobStatus::Completed.as_str())
    .bind(output_duration_sec)
    .bind(Utc::now().to_rfc3339())
    .bind(job_guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a job failed with an error message
pub async fn mark_job_failed(pool: &SqlitePool, job_guid: Uuid, message: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE processing_jobs
        SET status = ?, error_message = ?, completed_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(JobStatus::Failed.as_str())
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .bind(job_guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Store surrogate usage rows for a job
pub async fn record_surrogate_usage(
    pool: &SqlitePool,
    usage: &[SurrogateUsageRecord],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for row in usage {
        sqlx::query(
            r#"
            INSERT INTO surrogate_usage
                (job_guid, start_sec, end_sec, duration_sec, gender, category, language,
                 clip_id, clip_path, clip_duration_sec, strategy, placeholder)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.job_guid.to_string())
        .bind(row.start_sec)
        .bind(row.end_sec)
        .bind(row.duration_sec)
        .bind(&row.gender)
        .bind(&row.category)
        .bind(&row.language)
        .bind(&row.clip_id)
        .bind(&row.clip_path)
        .bind(row.clip_duration_sec)
        .bind(&row.strategy)
        .bind(row.placeholder)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load surrogate usage rows for a job, in segment order
pub async fn load_usage_for_job(
    pool: &SqlitePool,
    job_guid: Uuid,
) -> Result<Vec<SurrogateUsageRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT job_guid, start_sec, end_sec, duration_sec, gender, category, language,
               clip_id, clip_path, clip_duration_sec, strategy, placeholder
        FROM surrogate_usage
        WHERE job_guid = ?
        ORDER BY start_sec ASC
        "#,
    )
    .bind(job_guid.to_string())
    .fetch_all(pool)
    .await?;

    let mut usage = Vec::with_capacity(rows.len());
    for row in rows {
        let guid_str: String = row.get("job_guid");
        let job_guid = Uuid::parse_str(&guid_str)
            .map_err(|e| crate::Error::Internal(format!("Corrupt job guid {}: {}", guid_str, e)))?;

        usage.push(SurrogateUsageRecord {
            job_guid,
            start_sec: row.get("start_sec"),
            end_sec: row.get("end_sec"),
            duration_sec: row.get("duration_sec"),
            gender: row.get("gender"),
            category: row.get("category"),
            language: row.get("language"),
            clip_id: row.get("clip_id"),
            clip_path: row.get("clip_path"),
            clip_duration_sec: row.get("clip_duration_sec"),
            strategy: row.get("strategy"),
            placeholder: row.get("placeholder"),
        });
    }

    Ok(usage)
}
