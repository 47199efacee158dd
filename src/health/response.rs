use serde_json::{Map, Value};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Decodes a reasoning-service reply into a JSON object.
///
/// Surrounding Markdown fences are stripped first. This never fails: when the
/// text is not a JSON object the result is `{"error": .., "raw_response": ..}`
/// with the reply preserved verbatim.
pub fn parse_response(raw: &str) -> Map<String, Value> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    let text = text.trim();

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => fallback(
            format!("Failed to parse JSON response: expected an object, got {}", kind(&other)),
            raw,
        ),
        Err(e) => fallback(format!("Failed to parse JSON response: {e}"), raw),
    }
}

fn fallback(error: String, raw: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(error));
    map.insert("raw_response".to_string(), Value::String(raw.to_string()));
    map
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
