//! End-to-end replacement pipeline tests
//!
//! Build a surrogate library on disk, scan it, and run real audio through the
//! engine under both strategies.

mod helpers;

use std::sync::Arc;
use tempfile::TempDir;
use vmask_an::annotation::{Annotation, Gender, PiiCategory};
use vmask_an::audio::decode;
use vmask_an::replace::{ReplacementEngine, Strategy};
use vmask_an::surrogate::inventory::scan_surrogate_root;

fn annotation(start: f64, end: f64, gender: Gender, category: PiiCategory) -> Annotation {
    Annotation {
        start_sec: start,
        end_sec: end,
        gender,
        category,
        language: "english".to_string(),
    }
}

fn engine_for(root: &std::path::Path) -> ReplacementEngine {
    let inventory = scan_surrogate_root(root).unwrap();
    ReplacementEngine::new(Arc::new(inventory))
}

#[test]
fn test_fit_preserves_total_duration() {
    let dir = TempDir::new().unwrap();
    let surrogates = dir.path().join("surrogates");
    helpers::write_wav(
        &surrogates.join("english/male/person/clip.wav"),
        0.4,
        44100,
        2,
        300.0,
    );
    let track_path = dir.path().join("track.wav");
    helpers::write_wav(&track_path, 3.0, 44100, 2, 120.0);

    let engine = engine_for(&surrogates);
    let track = decode::decode_file(&track_path).unwrap();

    let outcome = engine
        .anonymize(
            &track,
            vec![annotation(1.0, 2.0, Gender::Male, PiiCategory::Person)],
            Strategy::Fit,
        )
        .unwrap();

    assert_eq!(outcome.audio.frames(), track.frames());
    assert_eq!(outcome.usage.len(), 1);
    assert_eq!(
        outcome.usage[0].clip_id.as_deref(),
        Some("english/male/person/clip.wav")
    );
    assert!(!outcome.usage[0].placeholder);
}

#[test]
fn test_direct_shifts_duration_by_clip_delta() {
    let dir = TempDir::new().unwrap();
    let surrogates = dir.path().join("surrogates");
    // 0.5 s clip at the track's own rate, so no resampler length jitter
    helpers::write_wav(
        &surrogates.join("english/female/location/town.wav"),
        0.5,
        44100,
        2,
        280.0,
    );
    let track_path = dir.path().join("track.wav");
    helpers::write_wav(&track_path, 3.0, 44100, 2, 120.0);

    let engine = engine_for(&surrogates);
    let track = decode::decode_file(&track_path).unwrap();

    let outcome = engine
        .anonymize(
            &track,
            vec![annotation(1.0, 2.0, Gender::Female, PiiCategory::Location)],
            Strategy::Direct,
        )
        .unwrap();

    // original - 1.0 s span + 0.5 s clip
    let expected = track.frames() as i64 - 44100 + 22050;
    assert!((outcome.audio.frames() as i64 - expected).abs() <= 2);
}

#[test]
fn test_gender_fallback_without_wrong_gender() {
    let dir = TempDir::new().unwrap();
    let surrogates = dir.path().join("surrogates");
    // Only a bare female clip exists
    helpers::write_wav(&surrogates.join("female/voice.wav"), 0.3, 16000, 1, 260.0);
    let track_path = dir.path().join("track.wav");
    helpers::write_wav(&track_path, 2.0, 44100, 2, 120.0);

    let engine = engine_for(&surrogates);
    let track = decode::decode_file(&track_path).unwrap();

    // A female query of any language/category falls back to the female clip
    let matched = engine
        .anonymize(
            &track,
            vec![annotation(0.5, 1.0, Gender::Female, PiiCategory::UserId)],
            Strategy::Fit,
        )
        .unwrap();
    assert_eq!(matched.usage[0].clip_id.as_deref(), Some("female/voice.wav"));

    // A male query must not borrow the female clip
    let unmatched = engine
        .anonymize(
            &track,
            vec![annotation(0.5, 1.0, Gender::Male, PiiCategory::UserId)],
            Strategy::Fit,
        )
        .unwrap();
    assert!(unmatched.usage[0].placeholder);
    assert!(unmatched.usage[0].clip_id.is_none());
}

#[test]
fn test_placeholder_keeps_duration_under_fit() {
    let dir = TempDir::new().unwrap();
    let track_path = dir.path().join("track.wav");
    helpers::write_wav(&track_path, 2.0, 22050, 1, 150.0);

    let engine = engine_for(&dir.path().join("no-surrogates"));
    let track = decode::decode_file(&track_path).unwrap();

    let outcome = engine
        .anonymize(
            &track,
            vec![annotation(0.25, 1.75, Gender::Male, PiiCategory::Other)],
            Strategy::Fit,
        )
        .unwrap();

    assert_eq!(outcome.audio.frames(), track.frames());
    assert!(outcome.usage[0].placeholder);
}

#[test]
fn test_clip_format_converted_to_track() {
    let dir = TempDir::new().unwrap();
    let surrogates = dir.path().join("surrogates");
    // Mono 16 kHz clip against a stereo 44.1 kHz track
    helpers::write_wav(
        &surrogates.join("english/male/person/narrow.wav"),
        1.0,
        16000,
        1,
        300.0,
    );
    let track_path = dir.path().join("track.wav");
    helpers::write_wav(&track_path, 3.0, 44100, 2, 120.0);

    let engine = engine_for(&surrogates);
    let track = decode::decode_file(&track_path).unwrap();

    let outcome = engine
        .anonymize(
            &track,
            vec![annotation(1.0, 2.0, Gender::Male, PiiCategory::Person)],
            Strategy::Fit,
        )
        .unwrap();

    // Output stays in the track's format and length
    assert_eq!(outcome.audio.sample_rate(), 44100);
    assert_eq!(outcome.audio.channels(), 2);
    assert_eq!(outcome.audio.frames(), track.frames());
}

#[test]
fn test_multiple_segments_stitch_in_order() {
    let dir = TempDir::new().unwrap();
    let surrogates = dir.path().join("surrogates");
    helpers::write_wav(
        &surrogates.join("english/male/person/a.wav"),
        0.2,
        44100,
        2,
        300.0,
    );
    helpers::write_wav(
        &surrogates.join("english/female/location/b.wav"),
        0.2,
        44100,
        2,
        340.0,
    );
    let track_path = dir.path().join("track.wav");
    helpers::write_wav(&track_path, 5.0, 44100, 2, 120.0);

    let engine = engine_for(&surrogates);
    let track = decode::decode_file(&track_path).unwrap();

    let outcome = engine
        .anonymize(
            &track,
            vec![
                annotation(3.0, 3.5, Gender::Female, PiiCategory::Location),
                annotation(0.5, 1.0, Gender::Male, PiiCategory::Person),
            ],
            Strategy::Fit,
        )
        .unwrap();

    assert_eq!(outcome.audio.frames(), track.frames());
    assert_eq!(outcome.usage.len(), 2);
    // Usage reports in track order regardless of submission order
    assert!(outcome.usage[0].start_sec < outcome.usage[1].start_sec);
    assert_eq!(
        outcome.usage[0].clip_id.as_deref(),
        Some("english/male/person/a.wav")
    );
}
