//! Response parsing - always recovers a narrative from unreliable replies.
//!
//! The parse pipeline, each step attempted only when the previous one did
//! not yield a usable result:
//!
//! 1. **Strip**: known non-JSON prefixes (scene counters, code fences)
//! 2. **Decode**: direct structured decode
//! 3. **Brace repair**: close braces and dangling strings on truncation
//! 4. **Quote repair**: close an unbalanced string value
//! 5. **Extraction**: regex-extract the narrative field straight from text
//! 6. **Cleanup**: strip key tokens and structure, keep the prose
//!
//! Whatever the input, [`parse`] returns a `(narrative, response)` pair and
//! never panics. The recovered narrative is plain prose: no `"narrative":`
//! tokens, no wrapper braces, never the literal text "null".

pub mod repair;

pub use repair::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Out-of-band bookkeeping the generative service attaches to a reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugInfo {
    pub dm_notes: Vec<String>,
    pub dice_rolls: Vec<String>,
    pub resources: String,
    pub state_rationale: String,
}

impl DebugInfo {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        Self {
            dm_notes: string_list(value, "dm_notes"),
            dice_rolls: string_list(value, "dice_rolls"),
            resources: string_field(value, "resources"),
            state_rationale: string_field(value, "state_rationale"),
        }
    }
}

/// One structured reply from the generative service.
///
/// Immutable once parsed; discarded after its `state_updates` are merged
/// into the canonical game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeResponse {
    /// In-character prose. May be empty, never a JSON fragment.
    pub narrative: String,

    /// Director-style commentary for out-of-character turns.
    pub god_mode_response: String,

    pub entities_mentioned: Vec<String>,

    pub location_confirmed: String,

    /// Nested key/value updates to merge into the game state.
    pub state_updates: Map<String, Value>,

    pub debug_info: DebugInfo,
}

impl NarrativeResponse {
    /// Shape a decoded JSON object into a response, defaulting every
    /// missing or null field. Nulls become empty strings, never "null".
    pub fn from_value(value: &Value) -> Self {
        Self {
            narrative: string_field(value, "narrative"),
            god_mode_response: string_field(value, "god_mode_response"),
            entities_mentioned: string_list(value, "entities_mentioned"),
            location_confirmed: string_field(value, "location_confirmed"),
            state_updates: value
                .get("state_updates")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            debug_info: DebugInfo::from_value(value.get("debug_info")),
        }
    }

    /// The narrative the player should see: a non-empty god-mode reply wins
    /// over the in-character narrative.
    pub fn selected_narrative(&self) -> &str {
        if !self.god_mode_response.trim().is_empty() {
            &self.god_mode_response
        } else {
            &self.narrative
        }
    }
}

/// Recover a clean narrative string and structured response from raw text.
///
/// Never panics; for any input a `(narrative, response)` pair comes back,
/// with empty-default fields when nothing could be recovered.
pub fn parse(raw: &str) -> (String, NarrativeResponse) {
    if let Some(value) = repair::decode_with_repairs(raw) {
        let response = NarrativeResponse::from_value(&value);
        let narrative = scrub_leaked_keys(response.selected_narrative());
        return (narrative, response);
    }

    // Structured decode is hopeless; extract the fields we care about
    // straight from the text.
    debug!("structured decode failed, extracting fields from raw text");
    let mut response = NarrativeResponse {
        god_mode_response: repair::extract_field(raw, "god_mode_response").unwrap_or_default(),
        narrative: repair::extract_field(raw, "narrative").unwrap_or_default(),
        ..NarrativeResponse::default()
    };

    let selected = response.selected_narrative();
    if !selected.is_empty() {
        let narrative = scrub_leaked_keys(selected);
        return (narrative, response);
    }

    // Last resort: keep whatever prose the reply contains.
    warn!("no narrative field recoverable, falling back to aggressive cleanup");
    let cleaned = repair::aggressive_cleanup(raw);
    response.narrative = cleaned.clone();
    (cleaned, response)
}

/// A recovered narrative must never leak reply structure. Nested JSON inside
/// a narrative string is rare but has been observed; strip it down to prose.
fn scrub_leaked_keys(narrative: &str) -> String {
    if narrative.contains("\"narrative\":") || narrative.contains("\"god_mode_response\":") {
        repair::aggressive_cleanup(narrative)
    } else {
        narrative.to_string()
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
