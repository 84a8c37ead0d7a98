//! Validation errors for typed entity construction.
//!
//! These are the only failure paths in the crate. Malformed numeric input is
//! silently coerced (see [`crate::entities::coerce_stat`]) and never produces
//! an error; a `SchemaError` always means a structurally invalid record the
//! caller must deal with.

use thiserror::Error;

/// Structural validation failures for typed records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The entity id does not match `^(pc|npc)_[a-z0-9_]+_\d+$`.
    #[error("invalid entity id `{id}`: pattern mismatch")]
    InvalidEntityId { id: String },

    /// Gender is required for NPCs.
    #[error("Gender is required for NPCs: `{name}` has none")]
    MissingGender { name: String },

    /// Current HP cannot exceed max HP after coercion.
    #[error("hp {hp} cannot exceed max HP {hp_max}")]
    HpExceedsMax { hp: i64, hp_max: i64 },
}
