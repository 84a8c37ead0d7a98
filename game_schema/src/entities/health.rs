//! Health tracking with defensive numeric coercion.
//!
//! Generative output routinely delivers HP as strings, floats, nulls, or
//! garbage. Coercion repairs all of that silently; the only input ever
//! rejected is a current HP that exceeds max HP *after* coercion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// Hit point totals for a character.
///
/// Invariant: after construction, `1 <= hp <= hp_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHealth")]
pub struct HealthStatus {
    hp: i64,
    hp_max: i64,
}

impl HealthStatus {
    /// Build from already-numeric values.
    ///
    /// Zero and negative values are floored to 1 rather than rejected; the
    /// single rejection case is `hp > hp_max` after that repair.
    pub fn new(hp: i64, hp_max: i64) -> Result<Self, SchemaError> {
        let hp = hp.max(1);
        let hp_max = hp_max.max(1);
        if hp > hp_max {
            return Err(SchemaError::HpExceedsMax { hp, hp_max });
        }
        Ok(Self { hp, hp_max })
    }

    /// Build from raw, untrusted JSON values.
    ///
    /// Each field is coerced independently via [`coerce_stat`], then the same
    /// single rejection rule as [`HealthStatus::new`] applies.
    pub fn from_raw(hp: Option<&Value>, hp_max: Option<&Value>) -> Result<Self, SchemaError> {
        Self::new(coerce_stat(hp), coerce_stat(hp_max))
    }

    /// Current hit points.
    pub fn hp(&self) -> i64 {
        self.hp
    }

    /// Maximum hit points.
    pub fn hp_max(&self) -> i64 {
        self.hp_max
    }

    /// Whether the character is at full health.
    pub fn is_full(&self) -> bool {
        self.hp == self.hp_max
    }

    /// Fraction of max HP remaining. `hp_max >= 1` by invariant, so this
    /// never divides by zero.
    pub fn ratio(&self) -> f64 {
        self.hp as f64 / self.hp_max as f64
    }

    /// Apply damage, keeping the invariant. The schema layer never records a
    /// character below 1 HP; defeat is a combat-state concern.
    pub fn apply_damage(&mut self, amount: i64) {
        self.hp = (self.hp - amount.max(0)).max(1);
    }

    /// Heal up to max HP.
    pub fn heal(&mut self, amount: i64) {
        self.hp = (self.hp + amount.max(0)).min(self.hp_max);
    }
}

/// Coerce a raw JSON value into a usable HP stat.
///
/// Integers and floats at or above 1 pass through (floats truncate); numeric
/// strings parse the same way; everything else (`null`, missing, zero,
/// negative, non-numeric) becomes 1. This function never fails.
pub fn coerce_stat(raw: Option<&Value>) -> i64 {
    let Some(raw) = raw else { return 1 };

    let parsed = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    };

    match parsed {
        Some(v) if v >= 1 => v,
        _ => 1,
    }
}

#[derive(Deserialize)]
struct RawHealth {
    #[serde(default)]
    hp: Value,
    #[serde(default)]
    hp_max: Value,
}

impl TryFrom<RawHealth> for HealthStatus {
    type Error = SchemaError;

    fn try_from(raw: RawHealth) -> Result<Self, Self::Error> {
        HealthStatus::from_raw(Some(&raw.hp), Some(&raw.hp_max))
    }
}
