//! Engine configuration.
//!
//! Only heuristics live here: the low-HP threshold and the narrative marker
//! vocabularies used by the consistency checks. Semantic tables such as the
//! time-of-day buckets are fixed constants, not configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunable knobs for the consistency engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HP fraction at or below which the narrative is expected to
    /// acknowledge the character's condition.
    pub low_hp_ratio: f64,

    /// Words that count as "the prose acknowledges a wounded character".
    pub wounded_markers: Vec<String>,

    /// Words that imply the character is down or dead.
    pub incapacitated_markers: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_hp_ratio: 0.25,
            wounded_markers: [
                "wounded",
                "injured",
                "bleeding",
                "hurt",
                "battered",
                "staggering",
                "limping",
            ]
            .map(String::from)
            .to_vec(),
            incapacitated_markers: [
                "unconscious",
                "defeated",
                "dying",
                "dead",
                "lifeless",
                "slain",
                "collapses",
                "collapsed",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl EngineConfig {
    /// Load a config from TOML text. Missing fields fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.low_hp_ratio > 0.0 && config.low_hp_ratio < 1.0);
        assert!(config.wounded_markers.iter().any(|m| m == "wounded"));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml_str("low_hp_ratio = 0.5").unwrap();
        assert_eq!(config.low_hp_ratio, 0.5);
        // Unspecified fields keep their defaults.
        assert!(!config.incapacitated_markers.is_empty());
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(EngineConfig::from_toml_str("low_hp_ratio = \"high\"").is_err());
    }
}
