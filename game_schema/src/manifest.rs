//! Scene manifests: the typed snapshot of who is on stage this turn.
//!
//! [`SceneManifest::from_game_state`] is the migration boundary for the
//! loosely-typed persistence mapping. Raw data is read exactly once, here;
//! everything downstream sees only typed records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::entities::{
    Character, CharacterProfile, EntityId, EntityKind, HealthStatus, Npc, PlayerCharacter,
};
use crate::error::SchemaError;

/// A character's standing within one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub character: Character,

    /// In the scene at all. Absent characters stay in the manifest so their
    /// records survive the turn, but they are never expected in prose.
    pub present: bool,

    /// Not currently hidden from the player.
    pub visible: bool,

    pub conscious: bool,
}

impl ManifestEntry {
    /// Whether the narrative is expected to be able to mention this character.
    pub fn expected(&self) -> bool {
        self.present && self.visible && self.conscious
    }
}

/// Typed snapshot of the scene for one narrative turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneManifest {
    pub current_location: String,
    pub player_characters: Vec<ManifestEntry>,
    pub npcs: Vec<ManifestEntry>,
    pub combat_active: bool,
    pub session_number: u32,
    pub turn_number: u32,

    /// Display names of everyone present, hidden or not.
    pub present_entities: Vec<String>,
}

impl SceneManifest {
    /// Convert the untyped legacy game-state mapping into typed records.
    ///
    /// Entity ids are generated from display names with a zero-padded counter
    /// unique within this call. Presence, visibility (`hidden` inverted) and
    /// consciousness default to the permissive value when the flags are
    /// missing. Rows that are not objects are skipped with a warning rather
    /// than failing the whole conversion; structural problems in rows that
    /// *are* readable (missing NPC gender, hp over max) surface as errors.
    pub fn from_game_state(
        raw: &Value,
        session_number: u32,
        turn_number: u32,
    ) -> Result<Self, SchemaError> {
        let current_location = raw
            .pointer("/world_data/current_location")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let combat_active = raw
            .pointer("/combat_state/active")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut counter = 0u32;
        let mut player_characters = Vec::new();
        let mut npcs = Vec::new();

        if let Some(block) = raw.get("player_character_data").and_then(Value::as_object) {
            let name = block.get("name").and_then(Value::as_str).unwrap_or("Player");
            counter += 1;
            let profile = CharacterProfile {
                entity_id: EntityId::generate(EntityKind::Player, name, counter)?,
                display_name: name.to_string(),
                aliases: Vec::new(),
                level: block.get("level").and_then(Value::as_u64).unwrap_or(1) as u32,
                health: HealthStatus::from_raw(block.get("hp"), block.get("hp_max"))?,
                current_location: current_location.clone(),
                faction: None,
                role: None,
            };
            player_characters.push(ManifestEntry {
                character: Character::Player(PlayerCharacter::new(profile)?),
                present: true,
                visible: true,
                conscious: true,
            });
        }

        if let Some(block) = raw.get("npc_data").and_then(Value::as_object) {
            for (name, row) in block {
                let Some(fields) = row.as_object() else {
                    warn!(npc = %name, "skipping non-object npc row");
                    continue;
                };
                counter += 1;

                let gender = fields
                    .get("gender")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .ok_or_else(|| SchemaError::MissingGender { name: name.clone() })?;

                let profile = CharacterProfile {
                    entity_id: EntityId::generate(EntityKind::Npc, name, counter)?,
                    display_name: name.clone(),
                    aliases: Vec::new(),
                    level: fields.get("level").and_then(Value::as_u64).unwrap_or(1) as u32,
                    health: HealthStatus::from_raw(fields.get("hp"), fields.get("hp_max"))?,
                    current_location: current_location.clone(),
                    faction: fields
                        .get("faction")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    role: fields.get("role").and_then(Value::as_str).map(str::to_string),
                };

                npcs.push(ManifestEntry {
                    character: Character::Npc(Npc::new(profile, gender)?),
                    present: fields.get("present").and_then(Value::as_bool).unwrap_or(true),
                    visible: !fields.get("hidden").and_then(Value::as_bool).unwrap_or(false),
                    conscious: fields
                        .get("conscious")
                        .and_then(Value::as_bool)
                        .unwrap_or(true),
                });
            }
        }

        let present_entities = player_characters
            .iter()
            .chain(npcs.iter())
            .filter(|entry| entry.present)
            .map(|entry| entry.character.display_name().to_string())
            .collect();

        Ok(Self {
            current_location,
            player_characters,
            npcs,
            combat_active,
            session_number,
            turn_number,
            present_entities,
        })
    }

    /// Display names the narrative may reference: present AND visible AND
    /// conscious, in manifest order (player characters first).
    pub fn expected_entities(&self) -> Vec<String> {
        self.player_characters
            .iter()
            .chain(self.npcs.iter())
            .filter(|entry| entry.expected())
            .map(|entry| entry.character.display_name().to_string())
            .collect()
    }
}
