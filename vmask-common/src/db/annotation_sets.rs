//! Annotation set persistence
//!
//! A set is stored as one `annotation_sets` row plus its normalized
//! `annotations` rows, atomically.

use crate::db::models::{AnnotationRecord, AnnotationSetRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Store an annotation set with its rows in one transaction
pub async fn store_annotation_set(
    pool: &SqlitePool,
    set: &AnnotationSetRecord,
    rows: &[AnnotationRecord],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO annotation_sets (guid, session_id, audio_fingerprint, original_filename, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(set.guid.to_string())
    .bind(&set.session_id)
    .bind(&set.audio_fingerprint)
    .bind(&set.original_filename)
    .bind(set.created_at.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO annotations (guid, set_guid, start_sec, end_sec, gender, category, language, clip_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.guid.to_string())
        .bind(set.guid.to_string())
        .bind(row.start_sec)
        .bind(row.end_sec)
        .bind(&row.gender)
        .bind(&row.category)
        .bind(&row.language)
        .bind(&row.clip_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load all annotation sets for a recording, each with its rows sorted by
/// start time. Sets are returned oldest first.
pub async fn load_annotation_sets(
    pool: &SqlitePool,
    audio_fingerprint: &str,
) -> Result<Vec<(AnnotationSetRecord, Vec<AnnotationRecord>)>> {
    let set_rows = sqlx::query(
        r#"
        SELECT guid, session_id, audio_fingerprint, original_filename, created_at
        FROM annotation_sets
        WHERE audio_fingerprint = ?
        ORDER BY created_at ASC, guid ASC
        "#,
    )
    .bind(audio_fingerprint)
    .fetch_all(pool)
    .await?;

    let mut sets = Vec::with_capacity(set_rows.len());
    for row in set_rows {
        let set = parse_set_row(&row)?;

        let ann_rows = sqlx::query(
            r#"
            SELECT guid, set_guid, start_sec, end_sec, gender, category, language, clip_id
            FROM annotations
            WHERE set_guid = ?
            ORDER BY start_sec ASC, end_sec ASC
            "#,
        )
        .bind(set.guid.to_string())
        .fetch_all(pool)
        .await?;

        let mut annotations = Vec::with_capacity(ann_rows.len());
        for ann in ann_rows {
            annotations.push(parse_annotation_row(&ann)?);
        }

        sets.push((set, annotations));
    }

    Ok(sets)
}

/// Count distinct sessions that have stored a set for a recording
pub async fn count_sessions_for(pool: &SqlitePool, audio_fingerprint: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT session_id) FROM annotation_sets WHERE audio_fingerprint = ?",
    )
    .bind(audio_fingerprint)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

fn parse_set_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnnotationSetRecord> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Corrupt set guid {}: {}", guid_str, e)))?;

    let created_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map_err(|e| Error::Internal(format!("Corrupt timestamp {}: {}", created_str, e)))?
        .with_timezone(&Utc);

    Ok(AnnotationSetRecord {
        guid,
        session_id: row.get("session_id"),
        audio_fingerprint: row.get("audio_fingerprint"),
        original_filename: row.get("original_filename"),
        created_at,
    })
}

fn parse_annotation_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnnotationRecord> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Corrupt annotation guid {}: {}", guid_str, e)))?;

    let set_guid_str: String = row.get("set_guid");
    let set_guid = Uuid::parse_str(&set_guid_str)
        .map_err(|e| Error::Internal(format!("Corrupt set guid {}: {}", set_guid_str, e)))?;

    Ok(AnnotationRecord {
        guid,
        set_guid,
        start_sec: row.get("start_sec"),
        end_sec: row.get("end_sec"),
        gender: row.get("gender"),
        category: row.get("category"),
        language: row.get("language"),
        clip_id: row.get("clip_id"),
    })
}
