//! Turning a raw classifier reply into a [`Classification`].
//!
//! Models wrap the JSON in prose, markdown fences or reasoning preambles, so
//! the object is located before it is parsed:
//! 1. anything up to the last `</think>` is dropped
//! 2. the first fenced code block is preferred when present
//! 3. otherwise the first balanced `{...}` span is taken

use serde_json::{Map, Value};

use super::classifier::{Classification, ClassificationError};
use crate::domains::posts::ExtractedFields;

pub fn parse_classifier_response(raw: &str) -> Result<Classification, ClassificationError> {
    let malformed = |reason: &str| ClassificationError::MalformedResponse {
        reason: reason.to_string(),
        raw: raw.to_string(),
    };

    let answer = strip_reasoning(raw);
    let candidate = extract_json_candidate(answer).ok_or_else(|| malformed("no JSON object found"))?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| malformed(&format!("invalid JSON: {}", e)))?;
    let Value::Object(object) = value else {
        return Err(malformed("JSON is not an object"));
    };

    let is_event = parse_is_event(object.get("is_event"))
        .ok_or_else(|| malformed("is_event is not a boolean"))?;

    let fields = ExtractedFields {
        title: string_field(&object, "title"),
        date: string_field(&object, "date"),
        place: string_field(&object, "place"),
        link: string_field(&object, "link"),
        description: string_field(&object, "description"),
    }
    .normalized();

    Ok(Classification { is_event, fields })
}

/// Text after the last `</think>`, or the whole reply.
fn strip_reasoning(raw: &str) -> &str {
    match raw.rfind("</think>") {
        Some(end) => &raw[end + "</think>".len()..],
        None => raw,
    }
}

fn extract_json_candidate(text: &str) -> Option<&str> {
    fenced_block(text)
        .and_then(first_json_object)
        .or_else(|| first_json_object(text))
}

/// Body of the first ``` fence with any language tag removed.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    let end = rest.find("```")?;

    let body = rest[..end].trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    Some(body.trim())
}

/// First top-level `{...}` span, ignoring braces inside JSON strings.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// `None` only for a value that cannot be read as a boolean.
fn parse_is_event(value: Option<&Value>) -> Option<bool> {
    match value {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(flag)) => Some(*flag),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" | "" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        Some(_) => None,
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
