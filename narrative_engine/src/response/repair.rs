//! JSON repair strategies for malformed generative replies.
//!
//! Each strategy is an independent pure function. [`decode_with_repairs`]
//! tries them in a fixed order and stops at the first candidate that decodes
//! to a JSON object. Each strategy in the cascade was added to fix one
//! observed failure mode of the generative service; keep them separate and
//! separately tested.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static SCENE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*scene\s*#?\s*\d+\s*:\s*").expect("valid scene prefix regex"));
static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*```(?:[A-Za-z]+)?\s*").expect("valid fence open regex"));
static FENCE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```\s*$").expect("valid fence close regex"));
static KEY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[A-Za-z_][A-Za-z0-9_]*"\s*:\s*"#).expect("valid key token regex")
});

/// Strip known non-JSON prefixes: markdown code fences and scene counters
/// such as `Scene #12:` (case/space insensitive).
///
/// Returns `None` when there was nothing to strip.
pub fn strip_prefixes(text: &str) -> Option<String> {
    let mut out = text.trim();
    let mut changed = false;

    if let Some(m) = FENCE_OPEN_RE.find(out) {
        out = &out[m.end()..];
        changed = true;
    }
    if let Some(m) = FENCE_CLOSE_RE.find(out) {
        out = &out[..m.start()];
        changed = true;
    }
    if let Some(m) = SCENE_PREFIX_RE.find(out) {
        out = &out[m.end()..];
        changed = true;
    }

    changed.then(|| out.to_string())
}

/// Close unbalanced braces on a truncated reply.
///
/// Counts `{` and `}`; when openers win, first closes an unterminated
/// trailing string value (odd number of unescaped quotes), then appends the
/// missing `}`. Returns `None` when braces already balance.
pub fn balance_braces(text: &str) -> Option<String> {
    let opens = text.matches('{').count();
    let closes = text.matches('}').count();
    if opens <= closes {
        return None;
    }

    let mut repaired = text.trim_end().to_string();
    if count_unescaped_quotes(&repaired) % 2 == 1 {
        repaired.push('"');
    }
    for _ in closes..opens {
        repaired.push('}');
    }
    Some(repaired)
}

/// Close an unbalanced string value when braces already balance.
///
/// With an odd number of unescaped `"`, inserts a closing quote before the
/// final `}` (or at the end when there is none). Returns `None` when quotes
/// already balance.
pub fn balance_quotes(text: &str) -> Option<String> {
    if count_unescaped_quotes(text) % 2 == 0 {
        return None;
    }

    let mut repaired = text.to_string();
    match repaired.rfind('}') {
        Some(pos) => repaired.insert(pos, '"'),
        None => repaired.push('"'),
    }
    Some(repaired)
}

/// Regex-extract a named string field's raw value directly from text,
/// un-escaping embedded quotes and newlines. Tolerates an unterminated
/// value (truncated reply); ignores everything around the field.
pub fn extract_field(text: &str, field: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)"#, regex::escape(field));
    let re = Regex::new(&pattern).ok()?;
    let captured = re.captures(text)?.get(1)?.as_str();
    Some(unescape(captured))
}

/// Last-resort cleanup: strip `"key":` tokens and structural braces and
/// brackets, leaving whatever prose remains.
pub fn aggressive_cleanup(text: &str) -> String {
    let without_keys = KEY_TOKEN_RE.replace_all(text, "");
    let without_structure: String = without_keys
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
        .collect();
    without_structure
        .trim()
        .trim_matches(|c: char| c == '"' || c == ',' || c.is_whitespace())
        .to_string()
}

/// Run the repair cascade until something decodes to a JSON object.
///
/// Order: prefix strip, direct decode, brace balance, quote balance. The
/// field-extraction and cleanup strategies work on raw text and belong to
/// the parser's fallback path, not to this decode loop.
pub fn decode_with_repairs(raw: &str) -> Option<Value> {
    let stripped = strip_prefixes(raw).unwrap_or_else(|| raw.trim().to_string());

    if let Some(value) = decode_object(&stripped) {
        return Some(value);
    }

    let strategies: [(&str, fn(&str) -> Option<String>); 2] = [
        ("balance_braces", balance_braces),
        ("balance_quotes", balance_quotes),
    ];
    for (name, strategy) in strategies {
        if let Some(candidate) = strategy(&stripped) {
            if let Some(value) = decode_object(&candidate) {
                debug!(strategy = name, "repaired malformed reply");
                return Some(value);
            }
        }
    }

    None
}

fn decode_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

fn count_unescaped_quotes(text: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => count += 1,
            _ => {}
        }
    }
    count
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(c);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_scene_prefix() {
        let out = strip_prefixes("Scene #12: {\"narrative\": \"X\"}").unwrap();
        assert_eq!(out, "{\"narrative\": \"X\"}");

        let out = strip_prefixes("scene # 3 : {}").unwrap();
        assert_eq!(out, "{}");
    }

    #[test]
    fn test_strip_code_fence() {
        let out = strip_prefixes("```json\n{\"narrative\": \"X\"}\n```").unwrap();
        assert_eq!(out, "{\"narrative\": \"X\"}");
    }

    #[test]
    fn test_strip_nothing_to_do() {
        assert!(strip_prefixes("{\"narrative\": \"X\"}").is_none());
    }

    #[test]
    fn test_balance_braces_appends_closers() {
        let out = balance_braces("{\"state\": {\"a\": 1").unwrap();
        assert_eq!(out, "{\"state\": {\"a\": 1}}");
        assert!(serde_json::from_str::<Value>(&out).is_ok());
    }

    #[test]
    fn test_balance_braces_closes_dangling_string() {
        let out = balance_braces("{\"narrative\": \"The dragon roars").unwrap();
        assert_eq!(out, "{\"narrative\": \"The dragon roars\"}");
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["narrative"], "The dragon roars");
    }

    #[test]
    fn test_balance_braces_balanced_input() {
        assert!(balance_braces("{\"a\": 1}").is_none());
    }

    #[test]
    fn test_balance_quotes() {
        let out = balance_quotes("{\"location_confirmed\": \"tavern}").unwrap();
        assert_eq!(out, "{\"location_confirmed\": \"tavern\"}");

        assert!(balance_quotes("{\"a\": \"b\"}").is_none());
    }

    #[test]
    fn test_balance_quotes_ignores_escaped() {
        // The escaped quote inside the value must not count.
        assert!(balance_quotes("{\"a\": \"say \\\"hi\\\"\"}").is_none());
    }

    #[test]
    fn test_extract_field_basic() {
        let text = "{\"narrative\": \"The cave is dark\", \"extra\": }";
        assert_eq!(
            extract_field(text, "narrative").unwrap(),
            "The cave is dark"
        );
    }

    #[test]
    fn test_extract_field_unescapes() {
        let text = r#"{"narrative": "She said \"run\"\nNow."}"#;
        assert_eq!(
            extract_field(text, "narrative").unwrap(),
            "She said \"run\"\nNow."
        );
    }

    #[test]
    fn test_extract_field_truncated_value() {
        let text = r#"{"narrative": "Cut off mid-sent"#;
        assert_eq!(extract_field(text, "narrative").unwrap(), "Cut off mid-sent");
    }

    #[test]
    fn test_extract_field_missing() {
        assert!(extract_field("no json here", "narrative").is_none());
        // Unquoted null is not a string value.
        assert!(extract_field("{\"narrative\": null}", "narrative").is_none());
    }

    #[test]
    fn test_aggressive_cleanup() {
        let out = aggressive_cleanup("{\"story\": \"Deep in the woods\"}");
        assert!(!out.contains("\"story\":"));
        assert!(!out.contains('{') && !out.contains('}'));
        assert!(out.contains("Deep in the woods"));
    }

    #[test]
    fn test_decode_with_repairs_cascade() {
        // Direct decode.
        assert!(decode_with_repairs("{\"narrative\": \"X\"}").is_some());

        // Prefix + truncation in one reply.
        let value = decode_with_repairs("Scene #7: {\"narrative\": \"The dragon roars").unwrap();
        assert_eq!(value["narrative"], "The dragon roars");

        // Quote imbalance with balanced braces.
        let value = decode_with_repairs("{\"narrative\": \"hi\", \"location_confirmed\": \"tavern}")
            .unwrap();
        assert_eq!(value["location_confirmed"], "tavern");

        // Hopeless input decodes to nothing.
        assert!(decode_with_repairs("not json at all").is_none());

        // Non-object JSON is not a structured reply.
        assert!(decode_with_repairs("\"bare string\"").is_none());
        assert_eq!(decode_with_repairs("{}"), Some(json!({})));
    }
}
