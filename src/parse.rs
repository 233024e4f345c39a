//! Structured-output parsing for gateway replies.
//!
//! The gateway returns opaque text that is *expected* to be JSON at most
//! call sites. Parsing returns an explicit [`ParseFailure`] carrying the raw
//! reply instead of an opaque error, so each call site can visibly choose
//! between degrading to a placeholder record and propagating.

use serde_json::Value;

/// A reply that could not be parsed as the expected structured form.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub raw: String,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "response was not valid JSON: {:.80}", self.raw)
    }
}

impl std::error::Error for ParseFailure {}

/// Parse a gateway reply as JSON, stripping markdown code fences first.
///
/// Models habitually wrap JSON in ```json fences even when told not to.
pub fn parse_json(raw: &str) -> Result<Value, ParseFailure> {
    let body = strip_fences(raw);
    serde_json::from_str(body).map_err(|_| ParseFailure {
        raw: raw.to_string(),
    })
}

/// Strip a surrounding markdown code fence, if present.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening fence line.
    match rest.find('\n') {
        Some(pos) if rest[..pos].chars().all(|c| c.is_ascii_alphanumeric()) => rest[pos..].trim(),
        _ => rest.trim(),
    }
}

/// Parse a numbered/bulleted clause list into trimmed lines, list markers
/// stripped, duplicates removed, encounter order preserved.
pub fn parse_clause_lines(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for line in strip_fences(raw).lines() {
        let base = line
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == '-')
            .trim();
        if base.is_empty() || !base.chars().any(|c| c.is_alphanumeric()) {
            continue;
        }
        if seen.insert(base.to_string()) {
            out.push(base.to_string());
        }
    }
    out
}

/// Pull a string field out of a JSON object, tolerating absent keys.
pub fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pull a string-array field out of a JSON object. A scalar string is
/// promoted to a one-element list; anything else yields an empty list.
pub fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let v = parse_json(r#"{"ChunkType": "facts"}"#).unwrap();
        assert_eq!(v["ChunkType"], "facts");
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"Summary\": \"one line\"}\n```";
        let v = parse_json(raw).unwrap();
        assert_eq!(v["Summary"], "one line");
    }

    #[test]
    fn test_parse_fenced_without_language_tag() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(parse_json(raw).unwrap()["a"], 1);
    }

    #[test]
    fn test_failure_carries_raw_text() {
        let err = parse_json("not json").unwrap_err();
        assert_eq!(err.raw, "not json");
    }

    #[test]
    fn test_clause_lines_strip_markers_and_dedupe() {
        let raw = "1. Section 420 IPC\n2) Section 406 IPC\n- Section 420 IPC\n\n3. Section 34 IPC";
        let lines = parse_clause_lines(raw);
        assert_eq!(
            lines,
            vec!["Section 420 IPC", "Section 406 IPC", "Section 34 IPC"]
        );
    }

    #[test]
    fn test_clause_lines_skip_noise() {
        let raw = "---\n***\n1. Confidentiality clause\n   \n";
        assert_eq!(parse_clause_lines(raw), vec!["Confidentiality clause"]);
    }

    #[test]
    fn test_list_field_promotes_scalar() {
        let v = json!({"KeyTerms": "termination"});
        assert_eq!(list_field(&v, "KeyTerms"), vec!["termination"]);
        let v = json!({"KeyTerms": ["a", "b"]});
        assert_eq!(list_field(&v, "KeyTerms"), vec!["a", "b"]);
        let v = json!({});
        assert!(list_field(&v, "KeyTerms").is_empty());
    }

    #[test]
    fn test_str_field_filters_empty() {
        let v = json!({"Summary": "  "});
        assert_eq!(str_field(&v, "Summary"), None);
        let v = json!({"Summary": "ok"});
        assert_eq!(str_field(&v, "Summary").as_deref(), Some("ok"));
    }
}
