//! Checkpoint consistency - narrative prose vs numeric state.
//!
//! Findings come back as data, never as errors: a discrepancy between what
//! the prose says and what the numbers say is a normal outcome for a
//! generative narrator, not an exceptional one.

use serde_json::{Map, Value};
use tracing::warn;

use super::GameState;
use crate::config::EngineConfig;

/// Compare the player's HP against what the narrative claims.
///
/// Returns one description per contradiction; an empty list means
/// consistent. Missing or null HP fields mean there is nothing to check.
/// `hp_max == 0` is tolerated only during character creation; outside of
/// it, that alone is the finding and ratio checks are skipped. The HP
/// ratio is computed only after `hp_max > 0` is confirmed, so no input can
/// cause a division error.
pub fn validate_checkpoint_consistency(
    state: &GameState,
    narrative: &str,
    config: &EngineConfig,
) -> Vec<String> {
    let mut findings = Vec::new();

    let hp = read_stat(&state.player_character_data, &["hp", "hp_current"]);
    let hp_max = read_stat(&state.player_character_data, &["hp_max"]);
    let (Some(hp), Some(hp_max)) = (hp, hp_max) else {
        return findings;
    };

    if hp_max == 0 {
        if state.character_creation_active() {
            // HP simply has not been assigned yet.
            return findings;
        }
        findings.push(format!(
            "player hp_max should not be 0 outside character creation (hp {hp})"
        ));
        return findings;
    }

    let ratio = hp as f64 / hp_max as f64;
    let prose = narrative.to_lowercase();
    let mentions_any =
        |markers: &[String]| markers.iter().any(|marker| prose.contains(&marker.to_lowercase()));

    if ratio <= config.low_hp_ratio
        && !mentions_any(&config.wounded_markers)
        && !mentions_any(&config.incapacitated_markers)
    {
        warn!(hp, hp_max, "narrative ignores a badly wounded player");
        findings.push(format!(
            "player is at {hp}/{hp_max} hp but the narrative does not acknowledge the wound"
        ));
    }

    if hp == hp_max && mentions_any(&config.incapacitated_markers) {
        warn!(hp, hp_max, "narrative implies incapacitation at full hp");
        findings.push(format!(
            "narrative implies the player is down but hp is full at {hp}/{hp_max}"
        ));
    }

    findings
}

/// Read an integer stat under the first key that carries one. `None` and
/// missing values read as absent, not as zero.
fn read_stat(block: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    for key in keys {
        match block.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) => {
                return n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
            }
            Some(Value::String(s)) => return s.trim().parse().ok(),
            Some(_) => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with_hp(hp: Value, hp_max: Value) -> GameState {
        let mut state = GameState::new();
        state.player_character_data.insert("hp".to_string(), hp);
        state
            .player_character_data
            .insert("hp_max".to_string(), hp_max);
        state
    }

    fn check(state: &GameState, narrative: &str) -> Vec<String> {
        validate_checkpoint_consistency(state, narrative, &EngineConfig::default())
    }

    #[test]
    fn test_consistent_state_is_clean() {
        let state = state_with_hp(json!(18), json!(20));
        assert!(check(&state, "You stride into the tavern, feeling strong.").is_empty());
    }

    #[test]
    fn test_zero_hp_max_during_creation_is_fine() {
        let mut state = state_with_hp(json!(0), json!(0));
        state
            .world_data
            .insert("character_creation_active".to_string(), json!(true));

        assert!(check(&state, "Choose your background.").is_empty());
    }

    #[test]
    fn test_zero_hp_max_outside_creation_is_one_finding() {
        let state = state_with_hp(json!(0), json!(0));
        let findings = check(&state, "You stand tall.");

        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("hp_max should not be 0"));
    }

    #[test]
    fn test_zero_hp_max_never_divides() {
        // Exercised across every hp value shape; must return, not panic.
        for hp in [json!(0), json!(-5), json!("12"), json!(null)] {
            let state = state_with_hp(hp, json!(0));
            let _ = check(&state, "anything");
        }
    }

    #[test]
    fn test_missing_hp_is_nothing_to_check() {
        let state = GameState::new();
        assert!(check(&state, "A quiet morning.").is_empty());

        let state = state_with_hp(json!(null), json!(null));
        assert!(check(&state, "A quiet morning.").is_empty());
    }

    #[test]
    fn test_low_hp_without_wounded_prose() {
        let state = state_with_hp(json!(3), json!(20));
        let findings = check(&state, "You feel great and sprint up the hill.");

        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("3/20"));
    }

    #[test]
    fn test_low_hp_with_wounded_prose_is_fine() {
        let state = state_with_hp(json!(3), json!(20));
        assert!(check(&state, "Bleeding badly, you limp onward, wounded.").is_empty());
    }

    #[test]
    fn test_full_hp_with_death_prose() {
        let state = state_with_hp(json!(20), json!(20));
        let findings = check(&state, "You collapse, unconscious, as darkness takes you.");

        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("20/20"));
    }

    #[test]
    fn test_string_hp_values_read() {
        let state = state_with_hp(json!("2"), json!("20"));
        let findings = check(&state, "Nothing seems wrong at all.");
        assert_eq!(findings.len(), 1);
    }
}
