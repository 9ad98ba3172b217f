//! Agreement record persistence
//!
//! Agreement records are derived data: they can always be recomputed from the
//! stored annotation sets. Inserts go through `store_record_if_absent` so two
//! recomputes racing each other (or the same recompute running twice) leave
//! exactly one row per matched pair.

use crate::db::models::{AgreementSummary, StoredAgreementRecord};
use crate::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Insert an agreement record unless its natural key already exists.
///
/// Returns true when a new row was inserted.
pub async fn store_record_if_absent(
    pool: &SqlitePool,
    record: &StoredAgreementRecord,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO agreement_records
            (audio_fingerprint, session_a, session_b, segment_start_sec, segment_end_sec,
             gender_a, gender_b, category_a, category_b, clip_a, clip_b,
             overlap_percent, level, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.audio_fingerprint)
    .bind(&record.session_a)
    .bind(&record.session_b)
    .bind(record.segment_start_sec)
    .bind(record.segment_end_sec)
    .bind(&record.gender_a)
    .bind(&record.gender_b)
    .bind(&record.category_a)
    .bind(&record.category_b)
    .bind(&record.clip_a)
    .bind(&record.clip_b)
    .bind(record.overlap_percent)
    .bind(&record.level)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all agreement records for a recording, in segment order
pub async fn load_records(
    pool: &SqlitePool,
    audio_fingerprint: &str,
) -> Result<Vec<StoredAgreementRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT audio_fingerprint, session_a, session_b, segment_start_sec, segment_end_sec,
               gender_a, gender_b, category_a, category_b, clip_a, clip_b,
               overlap_percent, level
        FROM agreement_records
        WHERE audio_fingerprint = ?
        ORDER BY session_a ASC, session_b ASC, segment_start_sec ASC
        "#,
    )
    .bind(audio_fingerprint)
    .fetch_all(pool)
    .await?;

    let records = rows
        .iter()
        .map(|row| StoredAgreementRecord {
            audio_fingerprint: row.get("audio_fingerprint"),
            session_a: row.get("session_a"),
            session_b: row.get("session_b"),
            segment_start_sec: row.get("segment_start_sec"),
            segment_end_sec: row.get("segment_end_sec"),
            gender_a: row.get("gender_a"),
            gender_b: row.get("gender_b"),
            category_a: row.get("category_a"),
            category_b: row.get("category_b"),
            clip_a: row.get("clip_a"),
            clip_b: row.get("clip_b"),
            overlap_percent: row.get("overlap_percent"),
            level: row.get("level"),
        })
        .collect();

    Ok(records)
}

/// Aggregate agreement statistics for one recording
pub async fn load_summary(pool: &SqlitePool, audio_fingerprint: &str) -> Result<AgreementSummary> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            SUM(CASE WHEN level = 'complete' THEN 1 ELSE 0 END) AS complete,
            SUM(CASE WHEN level = 'partial' THEN 1 ELSE 0 END) AS partial,
            SUM(CASE WHEN level = 'none' THEN 1 ELSE 0 END) AS none,
            AVG(overlap_percent) AS avg_overlap
        FROM agreement_records
        WHERE audio_fingerprint = ?
        "#,
    )
    .bind(audio_fingerprint)
    .fetch_one(pool)
    .await?;

    let total: i64 = row.get("total");
    let complete: i64 = row.get::<Option<i64>, _>("complete").unwrap_or(0);
    let partial: i64 = row.get::<Option<i64>, _>("partial").unwrap_or(0);
    let none: i64 = row.get::<Option<i64>, _>("none").unwrap_or(0);
    let avg_overlap: f64 = row.get::<Option<f64>, _>("avg_overlap").unwrap_or(0.0);

    let percent = |n: i64| {
        if total > 0 {
            100.0 * n as f64 / total as f64
        } else {
            0.0
        }
    };

    Ok(AgreementSummary {
        total_comparisons: total,
        complete,
        partial,
        none,
        complete_percent: percent(complete),
        partial_percent: percent(partial),
        none_percent: percent(none),
        avg_overlap_percent: avg_overlap,
    })
}
