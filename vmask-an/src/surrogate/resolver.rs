//! Surrogate clip resolution
//!
//! Maps a `(language, gender, category)` query onto a concrete clip through a
//! fixed six-level fallback, most specific first:
//!
//! 1. language + gender + category (gender-nested layout)
//! 2. language + category + gender (category-nested layout)
//! 3. language + category, any gender
//! 4. language + gender, any category
//! 5. gender + category, any language
//! 6. gender, any language, any category
//!
//! Within a level, selection is lexicographic by clip id. Every gendered level
//! matches the queried gender exactly: a female query can fall back to female
//! or ungendered clips, never to male ones. No match at any level is a
//! warning, not an error; the caller substitutes placeholder audio.

use crate::annotation::{Gender, PiiCategory};
use crate::surrogate::inventory::{Inventory, Nesting, SurrogateClip};
use tracing::{debug, warn};

/// Outcome of a surrogate lookup
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A concrete clip from the inventory
    Clip(SurrogateClip),
    /// Nothing matched at any fallback level; synthesize placeholder audio
    Placeholder,
}

impl Resolution {
    pub fn clip(&self) -> Option<&SurrogateClip> {
        match self {
            Resolution::Clip(clip) => Some(clip),
            Resolution::Placeholder => None,
        }
    }
}

/// Resolve one annotation's surrogate query against the inventory
pub fn resolve(
    inventory: &Inventory,
    language: &str,
    gender: Gender,
    category: PiiCategory,
) -> Resolution {
    let language = language.to_ascii_lowercase();

    let levels: [(Option<&str>, Option<Gender>, Option<PiiCategory>, Option<Nesting>); 6] = [
        (
            Some(language.as_str()),
            Some(gender),
            Some(category),
            Some(Nesting::GenderFirst),
        ),
        (
            Some(language.as_str()),
            Some(gender),
            Some(category),
            Some(Nesting::CategoryFirst),
        ),
        (Some(language.as_str()), None, Some(category), None),
        (Some(language.as_str()), Some(gender), None, None),
        (None, Some(gender), Some(category), None),
        (None, Some(gender), None, None),
    ];

    for (level, (lang, g, c, nesting)) in levels.iter().enumerate() {
        let candidates = inventory.lookup(*lang, *g, *c, *nesting);
        // Candidates come back ordered by id; first = lexicographic winner
        if let Some(clip) = candidates.first() {
            debug!(
                "Resolved {}/{}/{} at fallback level {}: {}",
                language,
                gender,
                category,
                level + 1,
                clip.id
            );
            return Resolution::Clip((*clip).clone());
        }
    }

    warn!(
        "No surrogate for language={}, gender={}, category={}; using placeholder",
        language, gender, category
    );
    Resolution::Placeholder
}

// ========================================
// Tests
// ========================================
