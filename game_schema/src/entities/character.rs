//! Character definitions: the PC/NPC tagged variant.

use serde::{Deserialize, Serialize};

use super::{EntityId, EntityKind, HealthStatus};
use crate::error::SchemaError;

/// Fields shared by every character regardless of kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub entity_id: EntityId,

    /// Free text; may contain punctuation and unicode.
    pub display_name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    pub level: u32,

    pub health: HealthStatus,

    /// Id of the location the character currently occupies.
    pub current_location: String,

    #[serde(default)]
    pub faction: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

/// A player-controlled character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCharacter {
    #[serde(flatten)]
    pub profile: CharacterProfile,
}

impl PlayerCharacter {
    /// Validate and wrap a profile as a player character.
    pub fn new(profile: CharacterProfile) -> Result<Self, SchemaError> {
        if profile.entity_id.kind() != EntityKind::Player {
            return Err(SchemaError::InvalidEntityId {
                id: profile.entity_id.as_str().to_string(),
            });
        }
        Ok(Self { profile })
    }
}

/// A non-player character. Gender is mandatory: downstream narrative
/// generation needs a pronoun for every NPC it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    #[serde(flatten)]
    pub profile: CharacterProfile,

    pub gender: String,
}

impl Npc {
    /// Validate and wrap a profile as an NPC.
    pub fn new(profile: CharacterProfile, gender: impl Into<String>) -> Result<Self, SchemaError> {
        if profile.entity_id.kind() != EntityKind::Npc {
            return Err(SchemaError::InvalidEntityId {
                id: profile.entity_id.as_str().to_string(),
            });
        }
        let gender = gender.into();
        if gender.trim().is_empty() {
            return Err(SchemaError::MissingGender {
                name: profile.display_name,
            });
        }
        Ok(Self { profile, gender })
    }
}

/// Any character in the game, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Character {
    Player(PlayerCharacter),
    Npc(Npc),
}

impl Character {
    pub fn entity_id(&self) -> &EntityId {
        &self.profile().entity_id
    }

    pub fn display_name(&self) -> &str {
        &self.profile().display_name
    }

    pub fn health(&self) -> &HealthStatus {
        &self.profile().health
    }

    pub fn is_npc(&self) -> bool {
        matches!(self, Character::Npc(_))
    }

    /// The shared profile behind either variant.
    pub fn profile(&self) -> &CharacterProfile {
        match self {
            Character::Player(pc) => &pc.profile,
            Character::Npc(npc) => &npc.profile,
        }
    }
}
