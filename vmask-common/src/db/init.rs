//! Database initialization
//!
//! Creates the database file on first run and brings the schema up to date.
//! All statements are idempotent, so init is safe to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; agreement recomputes
    // read annotation sets while anonymization jobs are writing
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_annotation_sets_table(&pool).await?;
    create_annotations_table(&pool).await?;
    create_processing_jobs_table(&pool).await?;
    create_surrogate_usage_table(&pool).await?;
    create_agreement_records_table(&pool).await?;

    Ok(pool)
}

async fn create_annotation_sets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotation_sets (
            guid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            audio_fingerprint TEXT NOT NULL,
            original_filename TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_annotation_sets_fingerprint
         ON annotation_sets(audio_fingerprint)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_annotations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotations (
            guid TEXT PRIMARY KEY,
            set_guid TEXT NOT NULL REFERENCES annotation_sets(guid) ON DELETE CASCADE,
            start_sec REAL NOT NULL,
            end_sec REAL NOT NULL,
            gender TEXT NOT NULL,
            category TEXT NOT NULL,
            language TEXT NOT NULL,
            clip_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_annotations_set ON annotations(set_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_processing_jobs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processing_jobs (
            guid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            audio_fingerprint TEXT NOT NULL,
            original_filename TEXT,
            strategy TEXT NOT NULL,
            status TEXT NOT NULL,
            error_message TEXT,
            input_duration_sec REAL,
            output_duration_sec REAL,
            created_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_processing_jobs_fingerprint
         ON processing_jobs(audio_fingerprint)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_processing_jobs_status ON processing_jobs(status)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_surrogate_usage_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surrogate_usage (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_guid TEXT NOT NULL REFERENCES processing_jobs(guid) ON DELETE CASCADE,
            start_sec REAL NOT NULL,
            end_sec REAL NOT NULL,
            duration_sec REAL NOT NULL,
            gender TEXT NOT NULL,
            category TEXT NOT NULL,
            language TEXT NOT NULL,
            clip_id TEXT,
            clip_path TEXT,
            clip_duration_sec REAL,
            strategy TEXT NOT NULL,
            placeholder INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_surrogate_usage_job ON surrogate_usage(job_guid)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_surrogate_usage_clip ON surrogate_usage(clip_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_agreement_records_table(pool: &SqlitePool) -> Result<()> {
    // The UNIQUE constraint is the dedupe key: re-running a comparison over
    // the same two sessions inserts nothing new
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agreement_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            audio_fingerprint TEXT NOT NULL,
            session_a TEXT NOT NULL,
            session_b TEXT NOT NULL,
            segment_start_sec REAL NOT NULL,
            segment_end_sec REAL NOT NULL,
            gender_a TEXT NOT NULL,
            gender_b TEXT NOT NULL,
            category_a TEXT NOT NULL,
            category_b TEXT NOT NULL,
            clip_a TEXT,
            clip_b TEXT,
            overlap_percent REAL NOT NULL,
            level TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(audio_fingerprint, session_a, session_b, segment_start_sec, segment_end_sec)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_agreement_records_fingerprint
         ON agreement_records(audio_fingerprint)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
