//! World-time consolidation.
//!
//! Historic saves and drifting generative output produce three layouts: a
//! bare `time_of_day` label, a `world_time` object with an `hour`, or both.
//! Consolidation leaves exactly one layout behind: a `world_time` object
//! whose `time_of_day` matches its hour bucket. The bucket and label tables
//! are fixed; downstream tests encode these exact values.

use serde_json::{json, Map, Value};

/// Merge drifted time layouts inside `world_data` into a single
/// `world_time` object.
///
/// - legacy label + hour-bearing `world_time`: the legacy label wins and
///   the legacy key is deleted
/// - hour without a label: the label is derived from the hour bucket
/// - bare label only: a representative hour is synthesized with
///   `minute = 0, second = 0`
/// - no time fields at all: nothing is fabricated
pub fn consolidate_world_time(world_data: &mut Map<String, Value>) {
    let legacy = world_data
        .get("time_of_day")
        .and_then(Value::as_str)
        .map(str::to_string);
    let hour = world_data
        .get("world_time")
        .and_then(|wt| wt.get("hour"))
        .and_then(value_as_hour);

    match (legacy, hour) {
        (Some(label), Some(_)) => {
            world_data.remove("time_of_day");
            if let Some(wt) = world_data.get_mut("world_time").and_then(Value::as_object_mut) {
                wt.insert("time_of_day".to_string(), Value::String(label));
            }
        }
        (None, Some(hour)) => {
            if let Some(wt) = world_data.get_mut("world_time").and_then(Value::as_object_mut) {
                if !wt.contains_key("time_of_day") {
                    wt.insert(
                        "time_of_day".to_string(),
                        Value::String(time_of_day_for_hour(hour).to_string()),
                    );
                }
            }
        }
        (Some(label), None) => {
            world_data.remove("time_of_day");
            world_data.insert(
                "world_time".to_string(),
                json!({
                    "hour": representative_hour(&label),
                    "minute": 0,
                    "second": 0,
                    "time_of_day": label,
                }),
            );
        }
        (None, None) => {}
    }
}

/// Fixed hour buckets for deriving a label.
pub fn time_of_day_for_hour(hour: i64) -> &'static str {
    match hour.rem_euclid(24) {
        0..=4 => "Deep Night",
        5..=6 => "Dawn",
        7..=11 => "Morning",
        12..=13 => "Midday",
        14..=17 => "Afternoon",
        18..=19 => "Evening",
        _ => "Night",
    }
}

/// Fixed representative hour for a bare label. Unrecognized labels land on
/// midday so a malformed label still yields a complete `world_time`.
pub fn representative_hour(label: &str) -> i64 {
    match label.trim().to_lowercase().as_str() {
        "deep night" => 2,
        "dawn" => 5,
        "morning" => 9,
        "midday" => 12,
        "afternoon" => 15,
        "evening" => 18,
        "night" => 21,
        _ => 12,
    }
}

fn value_as_hour(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_legacy_label_wins_over_derived() {
        let mut data = world(json!({
            "time_of_day": "Evening",
            "world_time": {"hour": 9, "minute": 30},
        }));
        consolidate_world_time(&mut data);

        assert!(data.get("time_of_day").is_none());
        assert_eq!(data["world_time"]["time_of_day"], "Evening");
        assert_eq!(data["world_time"]["hour"], 9);
        assert_eq!(data["world_time"]["minute"], 30);
    }

    #[test]
    fn test_hour_derives_label() {
        for (hour, label) in [
            (0, "Deep Night"),
            (4, "Deep Night"),
            (5, "Dawn"),
            (6, "Dawn"),
            (7, "Morning"),
            (11, "Morning"),
            (12, "Midday"),
            (13, "Midday"),
            (14, "Afternoon"),
            (17, "Afternoon"),
            (18, "Evening"),
            (19, "Evening"),
            (20, "Night"),
            (23, "Night"),
        ] {
            let mut data = world(json!({"world_time": {"hour": hour}}));
            consolidate_world_time(&mut data);
            assert_eq!(
                data["world_time"]["time_of_day"], label,
                "hour {hour} should bucket to {label}"
            );
        }
    }

    #[test]
    fn test_existing_label_not_overwritten() {
        let mut data = world(json!({"world_time": {"hour": 6, "time_of_day": "Sunrise"}}));
        consolidate_world_time(&mut data);
        assert_eq!(data["world_time"]["time_of_day"], "Sunrise");
    }

    #[test]
    fn test_bare_label_synthesizes_world_time() {
        let mut data = world(json!({"time_of_day": "Evening"}));
        consolidate_world_time(&mut data);

        assert!(data.get("time_of_day").is_none());
        assert_eq!(data["world_time"]["hour"], 18);
        assert_eq!(data["world_time"]["minute"], 0);
        assert_eq!(data["world_time"]["second"], 0);
        assert_eq!(data["world_time"]["time_of_day"], "Evening");
    }

    #[test]
    fn test_representative_hours_round_trip() {
        // Every synthesized hour must land back in its own bucket.
        for label in [
            "Deep Night",
            "Dawn",
            "Morning",
            "Midday",
            "Afternoon",
            "Evening",
            "Night",
        ] {
            assert_eq!(time_of_day_for_hour(representative_hour(label)), label);
        }
    }

    #[test]
    fn test_unknown_label_defaults_to_midday() {
        let mut data = world(json!({"time_of_day": "The Witching Hour"}));
        consolidate_world_time(&mut data);
        assert_eq!(data["world_time"]["hour"], 12);
        assert_eq!(data["world_time"]["time_of_day"], "The Witching Hour");
    }

    #[test]
    fn test_no_time_fields_no_fabrication() {
        let mut data = world(json!({"current_location": "crypt"}));
        consolidate_world_time(&mut data);
        assert!(data.get("world_time").is_none());
    }

    #[test]
    fn test_string_hour_tolerated() {
        let mut data = world(json!({"world_time": {"hour": "6"}}));
        consolidate_world_time(&mut data);
        assert_eq!(data["world_time"]["time_of_day"], "Dawn");
    }
}
