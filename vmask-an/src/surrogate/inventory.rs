//! Surrogate clip inventory
//!
//! Clips live under a surrogate root organized by directory, from most to
//! least specific: `<root>/<language>/<gender>/<category>/`,
//! `<root>/<language>/<category>/<gender>/`, `<root>/<language>/<category>/`,
//! `<root>/<gender>/<category>/`, `<root>/<gender>/`, and so on. The scanner
//! classifies each path component as a gender, a category, or a language and
//! builds the index once at startup; resolution never touches the filesystem,
//! so the storage medium behind the index is swappable.

use crate::annotation::{Gender, PiiCategory};
use crate::audio::decode;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Nesting order of the gender and category directories, for clips that carry
/// both. Inventories organized either way are searched as distinct fallback
/// levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    GenderFirst,
    CategoryFirst,
}

/// A surrogate voice clip available for replacement
#[derive(Debug, Clone)]
pub struct SurrogateClip {
    /// Path relative to the surrogate root; doubles as the stable identifier
    pub id: String,
    pub path: PathBuf,
    pub language: Option<String>,
    pub gender: Option<Gender>,
    pub category: Option<PiiCategory>,
    pub nesting: Option<Nesting>,
    pub duration_sec: f64,
}

/// Read-only clip index shared across all resolutions of a request
#[derive(Debug, Default)]
pub struct Inventory {
    clips: Vec<SurrogateClip>,
}

impl Inventory {
    /// Build an index from clips. Clips are ordered by id so candidate sets,
    /// and therefore resolution, are deterministic.
    pub fn from_clips(mut clips: Vec<SurrogateClip>) -> Self {
        clips.sort_by(|a, b| a.id.cmp(&b.id));
        Self { clips }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clips(&self) -> &[SurrogateClip] {
        &self.clips
    }

    /// Candidate clips whose attribute set matches the pattern exactly.
    ///
    /// `None` for language or category selects clips that carry no such
    /// attribute (a clip filed under `english/male/` is not a candidate for
    /// the `english/male/person/` level, and vice versa). `None` for nesting
    /// accepts either directory order.
    pub fn lookup(
        &self,
        language: Option<&str>,
        gender: Option<Gender>,
        category: Option<PiiCategory>,
        nesting: Option<Nesting>,
    ) -> Vec<&SurrogateClip> {
        self.clips
            .iter()
            .filter(|c| {
                c.language.as_deref() == language
                    && c.gender == gender
                    && c.category == category
                    && nesting.map_or(true, |n| c.nesting == Some(n))
            })
            .collect()
    }
}

/// Scan a surrogate root directory into an inventory.
///
/// Unreadable files and unclassifiable paths are skipped with a log line, not
/// errors; a missing root yields an empty inventory, which downstream resolves
/// every query to a placeholder.
pub fn scan_surrogate_root(root: &Path) -> Result<Inventory> {
    if !root.is_dir() {
        warn!(
            "Surrogate root {} does not exist; every query will resolve to a placeholder",
            root.display()
        );
        return Ok(Inventory::default());
    }

    let mut clips = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error accessing entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !decode::is_supported_extension(path) {
            continue;
        }

        let rel = match path.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };

        match classify_clip(root, rel) {
            Ok(mut clip) => match decode::probe_duration_sec(path) {
                Ok(duration) => {
                    clip.duration_sec = duration;
                    clips.push(clip);
                }
                Err(e) => warn!("Skipping unreadable clip {}: {}", path.display(), e),
            },
            Err(reason) => debug!("Ignoring {}: {}", rel.display(), reason),
        }
    }

    info!(
        "Surrogate inventory: {} clips under {}",
        clips.len(),
        root.display()
    );
    Ok(Inventory::from_clips(clips))
}

/// Derive a clip's attributes from its directory components.
///
/// Components naming a gender or category claim those slots; the first other
/// component is the language. A clip with neither gender nor category can
/// never be resolved, so it is rejected here.
fn classify_clip(root: &Path, rel: &Path) -> std::result::Result<SurrogateClip, String> {
    let mut language: Option<String> = None;
    let mut gender: Option<Gender> = None;
    let mut category: Option<PiiCategory> = None;
    let mut nesting: Option<Nesting> = None;

    let parent = rel.parent().unwrap_or_else(|| Path::new(""));
    for component in parent.components() {
        let name = component.as_os_str().to_string_lossy().to_ascii_lowercase();

        if let Some(g) = Gender::parse(&name) {
            if gender.is_some() {
                return Err("duplicate gender directory".to_string());
            }
            gender = Some(g);
            if category.is_some() && nesting.is_none() {
                nesting = Some(Nesting::CategoryFirst);
            }
        } else if let Some(c) = PiiCategory::parse(&name) {
            if category.is_some() {
                return Err("duplicate category directory".to_string());
            }
            category = Some(c);
            if gender.is_some() && nesting.is_none() {
                nesting = Some(Nesting::GenderFirst);
            }
        } else if language.is_none() {
            language = Some(name);
        } else {
            return Err(format!("unrecognized directory component '{}'", name));
        }
    }

    if gender.is_none() && category.is_none() {
        return Err("no gender or category directory in path".to_string());
    }

    Ok(SurrogateClip {
        id: rel.to_string_lossy().replace('\\', "/"),
        path: root.join(rel),
        language,
        gender,
        category,
        nesting,
        duration_sec: 0.0,
    })
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_test_wav(path: &Path, duration_sec: f64) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        let frames = (duration_sec * 16000.0) as usize;
        for i in 0..frames {
            let s = (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 16000.0).sin() * 0.4;
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_classify_full_triple_gender_first() {
        let clip = classify_clip(Path::new("/s"), Path::new("english/male/person/a.wav")).unwrap();
        assert_eq!(clip.language.as_deref(), Some("english"));
        assert_eq!(clip.gender, Some(Gender::Male));
        assert_eq!(clip.category, Some(PiiCategory::Person));
        assert_eq!(clip.nesting, Some(Nesting::GenderFirst));
        assert_eq!(clip.id, "english/male/person/a.wav");
    }

    #[test]
    fn test_classify_category_first() {
        let clip =
            classify_clip(Path::new("/s"), Path::new("luganda/location/female/b.wav")).unwrap();
        assert_eq!(clip.language.as_deref(), Some("luganda"));
        assert_eq!(clip.nesting, Some(Nesting::CategoryFirst));
    }

    #[test]
    fn test_classify_partial_layouts() {
        let gender_only = classify_clip(Path::new("/s"), Path::new("female/c.wav")).unwrap();
        assert_eq!(gender_only.language, None);
        assert_eq!(gender_only.gender, Some(Gender::Female));
        assert_eq!(gender_only.category, None);

        let lang_cat = classify_clip(Path::new("/s"), Path::new("english/person/d.wav")).unwrap();
        assert_eq!(lang_cat.gender, None);
        assert_eq!(lang_cat.category, Some(PiiCategory::Person));
    }

    #[test]
    fn test_classify_rejects_attributeless_paths() {
        assert!(classify_clip(Path::new("/s"), Path::new("e.wav")).is_err());
        assert!(classify_clip(Path::new("/s"), Path::new("english/e.wav")).is_err());
    }

    #[test]
    fn test_lookup_is_exact_on_attribute_set() {
        let make = |id: &str, rel: &str| {
            let mut clip = classify_clip(Path::new("/s"), Path::new(rel)).unwrap();
            clip.id = id.to_string();
            clip
        };
        let inventory = Inventory::from_clips(vec![
            make("full", "english/male/person/a.wav"),
            make("gender-only", "male/b.wav"),
        ]);

        let full = inventory.lookup(
            Some("english"),
            Some(Gender::Male),
            Some(PiiCategory::Person),
            Some(Nesting::GenderFirst),
        );
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].id, "full");

        // The gender-only level must not see the fully-specified clip
        let gender_only = inventory.lookup(None, Some(Gender::Male), None, None);
        assert_eq!(gender_only.len(), 1);
        assert_eq!(gender_only[0].id, "gender-only");
    }

    #[test]
    fn test_scan_builds_index_with_durations() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_test_wav(&root.join("english/male/person/a.wav"), 0.5);
        write_test_wav(&root.join("english/person/female/b.wav"), 0.25);
        write_test_wav(&root.join("male/c.wav"), 0.5);
        write_test_wav(&root.join("stray.wav"), 0.5); // no attributes, ignored
        std::fs::write(root.join("english/male/README.txt"), "not audio").unwrap();

        let inventory = scan_surrogate_root(root).unwrap();
        assert_eq!(inventory.len(), 3);
        assert!(inventory
            .clips()
            .iter()
            .all(|c| (c.duration_sec - 0.5).abs() < 0.01 || (c.duration_sec - 0.25).abs() < 0.01));
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let inventory = scan_surrogate_root(Path::new("/nonexistent/surrogates")).unwrap();
        assert!(inventory.is_empty());
    }
}
