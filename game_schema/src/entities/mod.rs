//! Entity definitions for the game world.

mod character;
mod health;
mod location;

pub use character::*;
pub use health::*;
pub use location::*;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::SchemaError;

static ENTITY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(pc|npc)_[a-z0-9_]+_\d+$").expect("valid entity id regex"));

/// Unique identifier for characters in the game.
///
/// Ids are human-readable slugs of the form `pc_aria_01` or `npc_grog_nak_02`,
/// derived from display names via [`sanitize_name_to_id`]. Deserialization
/// goes through [`EntityId::parse`], so an invalid id cannot enter through
/// serde either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl TryFrom<String> for EntityId {
    type Error = SchemaError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::parse(id)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl EntityId {
    /// Validate a raw id string against the entity id pattern.
    pub fn parse(id: impl Into<String>) -> Result<Self, SchemaError> {
        let id = id.into();
        if ENTITY_ID_RE.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(SchemaError::InvalidEntityId { id })
        }
    }

    /// Generate an id from a display name and a per-conversion counter.
    ///
    /// The numeric suffix is zero-padded so ids sort in creation order.
    /// Fails if the display name has no alphanumeric characters at all.
    pub fn generate(
        kind: EntityKind,
        display_name: &str,
        index: u32,
    ) -> Result<Self, SchemaError> {
        let slug = sanitize_name_to_id(display_name);
        Self::parse(format!("{}_{}_{:02}", kind.prefix(), slug, index))
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind encoded in the id prefix.
    pub fn kind(&self) -> EntityKind {
        if self.0.starts_with("pc_") {
            EntityKind::Player
        } else {
            EntityKind::Npc
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of characters, encoded as the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Npc,
}

impl EntityKind {
    /// Id prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Player => "pc",
            EntityKind::Npc => "npc",
        }
    }
}

/// Reduce a display name to a slug usable inside an entity id.
///
/// Lowercases, folds common Latin diacritics to ASCII, collapses every run of
/// characters outside `[a-z0-9]` (apostrophes, hyphens, punctuation, spaces)
/// into a single `_`, and trims leading/trailing separators. Returns `""`
/// when no alphanumeric character survives.
pub fn sanitize_name_to_id(display_name: &str) -> String {
    let lowered = display_name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_sep = false;

    for ch in lowered.chars() {
        let folded = if ch.is_ascii_alphanumeric() {
            Some(ch)
        } else {
            fold_diacritic(ch)
        };
        match folded {
            Some(c) => {
                if pending_sep && !slug.is_empty() {
                    slug.push('_');
                }
                pending_sep = false;
                slug.push(c);
            }
            None => pending_sep = true,
        }
    }

    slug
}

/// Map common accented Latin letters to their ASCII base letter.
fn fold_diacritic(ch: char) -> Option<char> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ß' | 'ś' | 'š' => 's',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_name_to_id("Aria"), "aria");
        assert_eq!(sanitize_name_to_id("Old Tom"), "old_tom");
    }

    #[test]
    fn test_sanitize_punctuation_collapses() {
        assert_eq!(sanitize_name_to_id("Grog'nak the Mighty"), "grog_nak_the_mighty");
        assert_eq!(sanitize_name_to_id("Mary-Jane  O'Hara"), "mary_jane_o_hara");
    }

    #[test]
    fn test_sanitize_diacritics_fold() {
        assert_eq!(sanitize_name_to_id("Éowyn"), "eowyn");
        assert_eq!(sanitize_name_to_id("Señor Núñez"), "senor_nunez");
    }

    #[test]
    fn test_sanitize_no_valid_characters() {
        assert_eq!(sanitize_name_to_id("!@#$%"), "");
        assert_eq!(sanitize_name_to_id("   "), "");
    }

    #[test]
    fn test_sanitize_trims_separators() {
        assert_eq!(sanitize_name_to_id("...Aria..."), "aria");
    }

    #[test]
    fn test_entity_id_parse_valid() {
        assert!(EntityId::parse("pc_aria_01").is_ok());
        assert!(EntityId::parse("npc_grog_nak_12").is_ok());
    }

    #[test]
    fn test_entity_id_parse_invalid() {
        for bad in ["aria_01", "pc_Aria_01", "npc_grog", "pc__01", "npc_grog_"] {
            let err = EntityId::parse(bad).unwrap_err();
            assert!(
                err.to_string().contains("pattern mismatch"),
                "unexpected error for {bad}: {err}"
            );
        }
    }

    #[test]
    fn test_entity_id_generate() {
        let id = EntityId::generate(EntityKind::Npc, "Grog'nak", 3).unwrap();
        assert_eq!(id.as_str(), "npc_grog_nak_03");
        assert_eq!(id.kind(), EntityKind::Npc);

        assert!(EntityId::generate(EntityKind::Player, "!!!", 1).is_err());
    }
}
