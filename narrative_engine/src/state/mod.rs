//! Canonical game state - the per-session aggregate every turn merges into.
//!
//! The generative service is not deterministic about shape: `combatants`
//! arrives as either a list of entries or a name-keyed map, numbers arrive
//! as strings, time fields drift between layouts. The policy throughout is
//! tolerance-via-normalization, never rejection; downstream callers depend
//! on that.

mod consistency;
mod time;

pub use consistency::*;
pub use time::*;

use game_schema::{SceneManifest, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::response::NarrativeResponse;

/// Combat bookkeeping inside the game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    #[serde(default)]
    pub active: bool,

    /// List or map on input; always a name-keyed map after
    /// [`CombatState::normalize_combatants`].
    #[serde(default)]
    pub combatants: Value,

    #[serde(default)]
    pub initiative_order: Vec<String>,
}

impl Default for CombatState {
    fn default() -> Self {
        Self {
            active: false,
            combatants: Value::Object(Map::new()),
            initiative_order: Vec::new(),
        }
    }
}

impl CombatState {
    /// Convert a list-shaped combatant roster into a name-keyed map, in
    /// place. Entries without a `name` are dropped. Idempotent; every other
    /// combat operation normalizes first.
    pub fn normalize_combatants(&mut self) {
        match &mut self.combatants {
            Value::Object(_) => {}
            Value::Array(entries) => {
                let mut by_name = Map::new();
                for entry in entries.drain(..) {
                    let name = entry
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    match name {
                        Some(name) => {
                            by_name.insert(name, entry);
                        }
                        None => warn!("dropping combatant entry without a name"),
                    }
                }
                self.combatants = Value::Object(by_name);
            }
            other => {
                if !other.is_null() {
                    warn!("resetting non-collection combatants value");
                }
                *other = Value::Object(Map::new());
            }
        }
    }
}

/// The canonical state of one game session.
///
/// Created once per session and exclusively owned by the turn handler; the
/// engine performs no locking of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default = "Uuid::new_v4")]
    pub session_id: Uuid,

    #[serde(default)]
    pub player_character_data: Map<String, Value>,

    /// NPC records keyed by display name.
    #[serde(default)]
    pub npc_data: Map<String, Value>,

    #[serde(default)]
    pub world_data: Map<String, Value>,

    #[serde(default)]
    pub combat_state: CombatState,

    #[serde(default)]
    pub debug_mode: bool,

    /// Keys this engine does not model explicitly. Survives round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            player_character_data: Map::new(),
            npc_data: Map::new(),
            world_data: Map::new(),
            combat_state: CombatState::default(),
            debug_mode: false,
            extra: Map::new(),
        }
    }
}

impl GameState {
    /// Fresh state for a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin combat with an initial roster (list or map shaped).
    ///
    /// Initiative order seeds from the normalized roster when the caller
    /// has not set one.
    pub fn start_combat(&mut self, combatants: Value) {
        self.combat_state.active = true;
        self.combat_state.combatants = combatants;
        self.combat_state.normalize_combatants();
        if self.combat_state.initiative_order.is_empty() {
            self.combat_state.initiative_order = self
                .combat_state
                .combatants
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default();
        }
        debug!(session = %self.session_id, "combat started");
    }

    /// End combat explicitly. This is the only transition back to inactive.
    pub fn end_combat(&mut self) {
        self.combat_state.active = false;
        self.combat_state.combatants = Value::Object(Map::new());
        self.combat_state.initiative_order.clear();
        debug!(session = %self.session_id, "combat ended");
    }

    /// Remove defeated non-player combatants and return their names in
    /// encounter order.
    ///
    /// PCs at zero HP stay on the roster, and emptying the roster does NOT
    /// end combat; only [`GameState::end_combat`] does that.
    pub fn cleanup_defeated_enemies(&mut self) -> Vec<String> {
        self.combat_state.normalize_combatants();
        let Some(roster) = self.combat_state.combatants.as_object_mut() else {
            return Vec::new();
        };

        let mut defeated = Vec::new();
        roster.retain(|name, entry| {
            let is_pc = entry.get("type").and_then(Value::as_str) == Some("pc");
            if !is_pc && combatant_hp(entry) <= 0 {
                defeated.push(name.clone());
                false
            } else {
                true
            }
        });

        self.combat_state
            .initiative_order
            .retain(|name| !defeated.contains(name));
        defeated
    }

    /// Deep-merge a `state_updates` mapping into the canonical state.
    ///
    /// Nested mappings merge key-by-key; anything else overwrites. Combat
    /// updates re-normalize the roster afterwards so shape drift in the
    /// update cannot stick.
    pub fn merge_state_updates(&mut self, update: &Map<String, Value>) {
        for (key, value) in update {
            match key.as_str() {
                "player_character_data" => merge_section(&mut self.player_character_data, value),
                "npc_data" => merge_section(&mut self.npc_data, value),
                "world_data" => merge_section(&mut self.world_data, value),
                "combat_state" => {
                    let mut current = serde_json::to_value(&self.combat_state)
                        .unwrap_or_else(|_| Value::Object(Map::new()));
                    deep_merge(&mut current, value);
                    self.combat_state = serde_json::from_value(current).unwrap_or_default();
                    self.combat_state.normalize_combatants();
                }
                "debug_mode" => {
                    if let Some(flag) = value.as_bool() {
                        self.debug_mode = flag;
                    }
                }
                "session_id" => {} // never overwritten by the service
                _ => match self.extra.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        self.extra.insert(key.clone(), value.clone());
                    }
                },
            }
        }
    }

    /// Fold one parsed reply into the state: merge its updates, then
    /// re-normalize the shapes the merge may have disturbed.
    pub fn apply_response(&mut self, response: &NarrativeResponse) {
        self.merge_state_updates(&response.state_updates);
        self.combat_state.normalize_combatants();
        time::consolidate_world_time(&mut self.world_data);
    }

    /// Serialize for persistence. Any attribute whose name begins with `_`
    /// is cache-only and excluded, at every nesting level.
    pub fn serialize(&self) -> Value {
        let mut value =
            serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()));
        strip_private_keys(&mut value);
        value
    }

    /// Rebuild from a persistence mapping. Unknown keys land in `extra`;
    /// a mapping too broken to read yields a fresh session state.
    pub fn deserialize(mapping: &Value) -> Self {
        let mut state: GameState = serde_json::from_value(mapping.clone()).unwrap_or_else(|err| {
            warn!(%err, "unreadable game state mapping, starting fresh");
            GameState::new()
        });
        state.combat_state.normalize_combatants();
        state
    }

    /// Build the typed scene snapshot for one narrative turn.
    ///
    /// The manifest conversion is the only reader of the loosely-typed
    /// sections; prompt construction downstream works from the typed
    /// records it returns.
    pub fn scene_manifest(
        &self,
        session_number: u32,
        turn_number: u32,
    ) -> Result<SceneManifest, SchemaError> {
        SceneManifest::from_game_state(&self.serialize(), session_number, turn_number)
    }

    /// Whether the session is mid character creation (HP not yet assigned).
    pub fn character_creation_active(&self) -> bool {
        let truthy = |value: Option<&Value>| value.and_then(Value::as_bool).unwrap_or(false);
        truthy(self.world_data.get("character_creation_active"))
            || truthy(self.extra.get("character_creation_active"))
    }
}

/// Recursive deep merge: mappings merge key-by-key, everything else is
/// overwritten by the update.
pub fn deep_merge(dest: &mut Value, src: &Value) {
    if let (Value::Object(dest_map), Value::Object(src_map)) = (&mut *dest, src) {
        for (key, value) in src_map {
            match dest_map.get_mut(key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    dest_map.insert(key.clone(), value.clone());
                }
            }
        }
    } else {
        *dest = src.clone();
    }
}

fn merge_section(dest: &mut Map<String, Value>, src: &Value) {
    let Some(src) = src.as_object() else {
        warn!("ignoring non-mapping update for a state section");
        return;
    };
    for (key, value) in src {
        match dest.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                dest.insert(key.clone(), value.clone());
            }
        }
    }
}

fn combatant_hp(entry: &Value) -> i64 {
    match entry.get("hp_current") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(1),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(1),
        // No HP recorded means nothing says this combatant is down.
        _ => 1,
    }
}

fn strip_private_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with('_'));
            for nested in map.values_mut() {
                strip_private_keys(nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_private_keys(item);
            }
        }
        _ => {}
    }
}
