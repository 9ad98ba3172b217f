//! Agreement recomputation over stored annotation sets
//!
//! Runs whenever a new annotation set lands for a recording that already has
//! at least one other session's set. Every session pair is re-compared and the
//! resulting records written through the keyed insert-or-skip, so overlapping
//! recomputes (two sessions finishing at once) converge on the same rows.

use crate::agreement::engine::{compare, ComparableAnnotation, SessionAnnotations};
use crate::annotation::{Gender, PiiCategory};
use crate::Result;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use vmask_common::db::models::{AnnotationRecord, AnnotationSetRecord, StoredAgreementRecord};
use vmask_common::db::{agreement as agreement_db, annotation_sets};

/// Recompute and persist agreement records for one recording.
///
/// Returns the number of records actually inserted; zero means every matched
/// pair was already stored. Stored sets that no longer parse are skipped with
/// a warning and never abort the rest of the batch.
pub async fn recompute_for_fingerprint(
    pool: &SqlitePool,
    audio_fingerprint: &str,
) -> Result<usize> {
    let stored = annotation_sets::load_annotation_sets(pool, audio_fingerprint).await?;

    // Latest comparable set per session wins; sets load oldest first. The
    // BTreeMap keeps sessions in id order, so pair orientation (and with it
    // the dedupe key) is stable no matter which session stored last.
    let mut by_session: BTreeMap<String, SessionAnnotations> = BTreeMap::new();
    for (set, rows) in &stored {
        if let Some(parsed) = to_session_annotations(set, rows) {
            by_session.insert(parsed.session_id.clone(), parsed);
        }
    }

    if by_session.len() < 2 {
        debug!(
            "Fewer than two comparable sessions for {}; nothing to compare",
            audio_fingerprint
        );
        return Ok(0);
    }

    let sessions: Vec<&SessionAnnotations> = by_session.values().collect();
    let mut inserted = 0usize;

    for i in 0..sessions.len() {
        for j in (i + 1)..sessions.len() {
            let comparison = compare(sessions[i], sessions[j]);

            for record in &comparison.records {
                let stored_record = StoredAgreementRecord {
                    audio_fingerprint: audio_fingerprint.to_string(),
                    session_a: record.session_a.clone(),
                    session_b: record.session_b.clone(),
                    segment_start_sec: record.segment_start_sec,
                    segment_end_sec: record.segment_end_sec,
                    gender_a: record.gender_a.to_string(),
                    gender_b: record.gender_b.to_string(),
                    category_a: record.category_a.to_string(),
                    category_b: record.category_b.to_string(),
                    clip_a: record.clip_a.clone(),
                    clip_b: record.clip_b.clone(),
                    overlap_percent: record.overlap_percent,
                    level: record.level.as_str().to_string(),
                };
                if agreement_db::store_record_if_absent(pool, &stored_record).await? {
                    inserted += 1;
                }
            }

            info!(
                "Compared {} vs {} on {}: {} matched, {} A-only, {} B-only",
                comparison.metrics.session_a,
                comparison.metrics.session_b,
                audio_fingerprint,
                comparison.metrics.matched,
                comparison.metrics.a_only,
                comparison.metrics.b_only
            );
        }
    }

    Ok(inserted)
}

/// Parse one stored set into comparable form.
///
/// Returns None when any row carries a gender or category outside the known
/// vocabulary; the set is skipped, the comparison batch continues.
fn to_session_annotations(
    set: &AnnotationSetRecord,
    rows: &[AnnotationRecord],
) -> Option<SessionAnnotations> {
    let mut entries = Vec::with_capacity(rows.len());

    for row in rows {
        match (Gender::parse(&row.gender), PiiCategory::parse(&row.category)) {
            (Some(gender), Some(category)) => entries.push(ComparableAnnotation {
                start_sec: row.start_sec,
                end_sec: row.end_sec,
                gender,
                category,
                clip_id: row.clip_id.clone(),
            }),
            _ => {
                warn!(
                    "Skipping malformed stored set {} from session {}: row {} has gender='{}', category='{}'",
                    set.guid, set.session_id, row.guid, row.gender, row.category
                );
                return None;
            }
        }
    }

    Some(SessionAnnotations {
        session_id: set.session_id.clone(),
        entries,
    })
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn set_record(session: &str) -> AnnotationSetRecord {
        AnnotationSetRecord {
            guid: Uuid::new_v4(),
            session_id: session.to_string(),
            audio_fingerprint: "fp".to_string(),
            original_filename: None,
            created_at: Utc::now(),
        }
    }

    fn row(set_guid: Uuid, gender: &str, category: &str) -> AnnotationRecord {
        AnnotationRecord {
            guid: Uuid::new_v4(),
            set_guid,
            start_sec: 1.0,
            end_sec: 2.0,
            gender: gender.to_string(),
            category: category.to_string(),
            language: "english".to_string(),
            clip_id: None,
        }
    }

    #[test]
    fn test_parses_well_formed_set() {
        let set = set_record("session-a");
        let rows = vec![row(set.guid, "male", "person"), row(set.guid, "female", "other")];

        let parsed = to_session_annotations(&set, &rows).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].gender, Gender::Male);
        assert_eq!(parsed.entries[1].category, PiiCategory::Other);
    }

    #[test]
    fn test_malformed_row_skips_whole_set() {
        let set = set_record("session-a");
        let rows = vec![row(set.guid, "male", "person"), row(set.guid, "robot", "person")];

        assert!(to_session_annotations(&set, &rows).is_none());
    }
}
