//! Structured-output recovery for untrusted model responses.
//!
//! Model calls are expected to return a single JSON object, but in practice
//! the text may be wrapped in markdown fencing, truncated mid-string, or
//! not JSON at all. This module parses and, on failure, heuristically
//! repairs that text. All failure modes resolve to a value plus a recovery
//! flag; nothing here ever panics or returns an error.
//!
//! The repair step is a bounded heuristic, not a general JSON recovery
//! algorithm: it only appends the closing tokens needed to balance quote,
//! brace, and bracket counts. Tests pin its exact behavior.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Result of [`parse_or_repair`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// The parsed (or fallback) value.
    pub value: Value,
    /// True when strict parsing failed and the repaired text parsed.
    pub was_repaired: bool,
    /// The raw input, surfaced for diagnostics when even repair failed.
    pub raw: Option<String>,
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        Regex::new(r"(?m)^```(?:json)?\n|```$").unwrap()
    })
}

/// Removes leading/trailing markdown code-fence markers.
///
/// Pure, total function: text without fencing passes through trimmed but
/// otherwise unchanged.
#[must_use]
pub fn strip_wrapper(text: &str) -> String {
    fence_regex().replace_all(text.trim(), "").trim().to_string()
}

/// Appends the minimum closing tokens needed to balance quote, brace, and
/// bracket counts.
///
/// Append-only: the existing text is never altered. Quotes are balanced
/// first, then braces, then brackets; the token order is pinned by tests.
#[must_use]
pub fn repair_json(text: &str) -> String {
    let mut repaired = text.to_string();

    if text.matches('"').count() % 2 != 0 {
        repaired.push('"');
    }

    let open_braces = text.matches('{').count();
    let close_braces = text.matches('}').count();
    if open_braces > close_braces {
        repaired.push_str(&"}".repeat(open_braces - close_braces));
    }

    let open_brackets = text.matches('[').count();
    let close_brackets = text.matches(']').count();
    if open_brackets > close_brackets {
        repaired.push_str(&"]".repeat(open_brackets - close_brackets));
    }

    repaired
}

/// True when the parsed value has a shape compatible with the fallback.
///
/// A parse that succeeds but yields (say) a bare number where the caller's
/// contract expects an object does not satisfy that contract, so it is
/// treated the same as a parse failure.
fn shape_matches(value: &Value, fallback: &Value) -> bool {
    match fallback {
        Value::Object(_) => value.is_object(),
        Value::Array(_) => value.is_array(),
        _ => true,
    }
}

/// Parses `text` as JSON, repairing on failure, with a guaranteed result.
///
/// 1. Strict parse; on success the value is returned unmodified.
/// 2. On failure, [`repair_json`] is applied and the parse re-attempted.
/// 3. If repair also fails, `fallback` is returned with
///    `was_repaired = false` and the raw text surfaced for diagnostics.
pub fn parse_or_repair(text: &str, fallback: Value) -> Recovered {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if shape_matches(&value, &fallback) {
            return Recovered {
                value,
                was_repaired: false,
                raw: None,
            };
        }
    }

    let repaired = repair_json(text);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        if shape_matches(&value, &fallback) {
            tracing::debug!(raw_len = text.len(), "recovered truncated model output");
            return Recovered {
                value,
                was_repaired: true,
                raw: None,
            };
        }
    }

    tracing::warn!(raw_len = text.len(), "model output unrecoverable, using fallback shape");
    Recovered {
        value: fallback,
        was_repaired: false,
        raw: Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_strip_wrapper_fenced_json() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_wrapper(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_wrapper_plain_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_wrapper(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_wrapper_no_fence_passthrough() {
        assert_eq!(strip_wrapper("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_repair_closes_truncated_object() {
        assert_eq!(repair_json(r#"{"a": [1, 2"#), r#"{"a": [1, 2}]"#);
    }

    #[test]
    fn test_repair_closes_unterminated_string() {
        assert_eq!(repair_json(r#"{"a": "b"#), r#"{"a": "b"}"#);
    }

    #[test]
    fn test_repair_is_noop_on_balanced_text() {
        let text = r#"{"a": 1}"#;
        assert_eq!(repair_json(text), text);
    }

    #[test]
    fn test_parse_valid_input_unmodified() {
        let text = r#"{"scores": {"Budget": {"score": 7}}}"#;
        let result = parse_or_repair(text, json!({}));
        assert!(!result.was_repaired);
        assert!(result.raw.is_none());
        assert_eq!(
            result.value,
            serde_json::from_str::<Value>(text).unwrap()
        );
    }

    #[test]
    fn test_parse_repairs_truncated_object() {
        let result = parse_or_repair(r#"{"a": {"b": 1"#, json!({}));
        assert!(result.was_repaired);
        assert_eq!(result.value, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_only_opening_braces_falls_back() {
        let fallback = json!({"scores": {}});
        let result = parse_or_repair("{{{", fallback.clone());
        assert!(!result.was_repaired);
        assert_eq!(result.value, fallback);
        assert_eq!(result.raw.as_deref(), Some("{{{"));
    }

    #[test]
    fn test_unterminated_string_mid_key_falls_back() {
        let fallback = json!({});
        let result = parse_or_repair(r#"{"ke"#, fallback.clone());
        assert!(!result.was_repaired);
        assert_eq!(result.value, fallback);
    }

    #[test]
    fn test_valid_non_object_honors_fallback_contract() {
        let fallback = json!({"scores": {}});
        let result = parse_or_repair("[1, 2, 3]", fallback.clone());
        assert!(!result.was_repaired);
        assert_eq!(result.value, fallback);
        assert_eq!(result.raw.as_deref(), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_empty_input_falls_back() {
        let fallback = json!({"scores": {}});
        let result = parse_or_repair("", fallback.clone());
        assert!(!result.was_repaired);
        assert_eq!(result.value, fallback);
    }

    #[test]
    fn test_array_fallback_accepts_array() {
        let result = parse_or_repair("[1, 2", json!([]));
        assert!(result.was_repaired);
        assert_eq!(result.value, json!([1, 2]));
    }
}
