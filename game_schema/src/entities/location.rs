//! Location definitions.

use serde::{Deserialize, Serialize};

/// A place in the game world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub entity_id: String,

    pub display_name: String,

    /// Ids of locations reachable from here.
    #[serde(default)]
    pub connected_locations: Vec<String>,
}

impl Location {
    /// Create a location with no connections.
    pub fn new(entity_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            display_name: display_name.into(),
            connected_locations: Vec::new(),
        }
    }

    /// Whether this location connects directly to another.
    pub fn connects_to(&self, location_id: &str) -> bool {
        self.connected_locations.iter().any(|id| id == location_id)
    }
}
