//! Reading generated payloads
//!
//! The generation service returns loosely shaped JSON. These helpers pull
//! prompt texts, validator source and test cases out of the shapes it is
//! known to produce.

use serde_json::Value;

const TEXT_LIST_KEYS: [&str; 6] = ["ai", "messages", "prompts", "variants", "escalations", "values"];
const VALIDATOR_KEYS: [&str; 4] = ["validator", "code", "source", "script"];
const TEST_CASE_KEYS: [&str; 4] = ["testCases", "tests", "cases", "items"];

/// Prompt texts carried by a payload, in order
///
/// Accepts a string, an array of strings or `{text}` objects, or an object
/// wrapping such a list under a well-known key.
#[must_use]
pub fn prompt_texts(payload: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_texts(payload, &mut out);
    out
}

fn collect_texts(payload: &Value, out: &mut Vec<String>) {
    match payload {
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_texts(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                collect_texts(text, out);
            } else if let Some(list) = TEXT_LIST_KEYS.iter().find_map(|k| map.get(*k)) {
                collect_texts(list, out);
            } else if map.contains_key("r1") || map.contains_key("r2") {
                for key in ["r1", "r2"] {
                    if let Some(v) = map.get(key) {
                        collect_texts(v, out);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Validator source carried by a payload
#[must_use]
pub fn validator_source(payload: &Value) -> Option<String> {
    match payload {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => VALIDATOR_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(payload.to_string())),
        other => Some(other.to_string()),
    }
}

/// Test cases carried by a payload
#[must_use]
pub fn test_cases(payload: &Value) -> Vec<Value> {
    match payload {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        Value::Object(map) => TEST_CASE_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .cloned()
            .unwrap_or_else(|| vec![payload.clone()]),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn texts_from_plain_shapes() {
        assert_eq!(prompt_texts(&json!("Hi")), vec!["Hi"]);
        assert_eq!(prompt_texts(&json!(["a", " ", "b"])), vec!["a", "b"]);
        assert_eq!(
            prompt_texts(&json!([{ "text": "a" }, { "text": "b" }])),
            vec!["a", "b"]
        );
    }

    #[test]
    fn texts_from_wrapped_shapes() {
        assert_eq!(
            prompt_texts(&json!({ "ai": ["first", "second"] })),
            vec!["first", "second"]
        );
        assert_eq!(
            prompt_texts(&json!({ "r1": "one", "r2": "two" })),
            vec!["one", "two"]
        );
        assert!(prompt_texts(&json!({ "unrelated": 1 })).is_empty());
        assert!(prompt_texts(&json!(null)).is_empty());
    }

    #[test]
    fn validator_shapes() {
        assert_eq!(validator_source(&json!("x > 0")).as_deref(), Some("x > 0"));
        assert_eq!(
            validator_source(&json!({ "validator": "fn ok" })).as_deref(),
            Some("fn ok")
        );
        assert_eq!(
            validator_source(&json!({ "rules": [1] })).as_deref(),
            Some(r#"{"rules":[1]}"#)
        );
        assert!(validator_source(&json!("")).is_none());
        assert!(validator_source(&json!(null)).is_none());
    }

    #[test]
    fn test_case_shapes() {
        assert_eq!(test_cases(&json!([1, 2])).len(), 2);
        assert_eq!(
            test_cases(&json!({ "testCases": [{ "input": "1" }] })),
            vec![json!({ "input": "1" })]
        );
        assert_eq!(test_cases(&json!({ "input": "x" })).len(), 1);
        assert!(test_cases(&json!(null)).is_empty());
    }
}
