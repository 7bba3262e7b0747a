//! Response normalizer
//!
//! Turns whatever text a generation backend returns into well-formed
//! structured data. Backends are inconsistent: sometimes raw JSON,
//! sometimes the payload envelope, sometimes markdown fences, sometimes
//! conversational prose around the answer. Normalization is an ordered
//! chain of strategies, tried in sequence until one succeeds.

use crate::error::PipelineError;
use crate::types::Intent;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

fn quoted_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([A-Z]+)'").expect("static regex"))
}

/// Strip a leading/trailing markdown code fence pair
///
/// Handles ```json, ```sql, and bare ``` fences. Text without fences is
/// returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    // Drop the opening fence line (``` or ```json etc.)
    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => return trimmed.trim_matches('`').trim().to_string(),
    };

    let inner = after_open.trim_end();
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim().to_string()
}

/// Strategy 1: the whole text parses as a JSON object
fn parse_direct(text: &str) -> Option<JsonValue> {
    let value: JsonValue = serde_json::from_str(text).ok()?;
    value.is_object().then_some(value)
}

/// Strategy 3: slice between the first `{` and the last `}`
fn slice_object(text: &str) -> Option<JsonValue> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: JsonValue = serde_json::from_str(&text[start..=end]).ok()?;
    value.is_object().then_some(value)
}

/// Normalize generator text into a JSON object
///
/// Order: fence-strip and parse directly; unwrap a `{"response": "..."}`
/// envelope and extract from within; slice between the outermost braces.
/// A direct parse that turns out to be the envelope is unwrapped rather
/// than returned, since callers want the object the model produced, not
/// the backend's wrapper.
pub fn extract_json_object(text: &str) -> Result<JsonValue, PipelineError> {
    let cleaned = strip_code_fences(text);

    if let Some(value) = parse_direct(&cleaned) {
        match value.get("response").and_then(|r| r.as_str()) {
            Some(inner) => {
                let inner = strip_code_fences(inner);
                if let Some(unwrapped) = parse_direct(&inner).or_else(|| slice_object(&inner)) {
                    return Ok(unwrapped);
                }
                return Err(PipelineError::Unparsable(format!(
                    "no JSON object inside response wrapper: {}",
                    inner
                )));
            }
            None => return Ok(value),
        }
    }

    if let Some(value) = slice_object(&cleaned) {
        return Ok(value);
    }

    Err(PipelineError::Unparsable(format!(
        "no JSON object found in generator text: {}",
        text
    )))
}

/// Pull the classification token out of generator text
///
/// Unwraps the payload envelope if present, then rescues verbose answers
/// of the shape `...the output would be 'FILTER'` via quoted-word
/// search, and finally falls back to the first whitespace token with
/// non-alphabetic characters stripped.
pub fn extract_intent_token(text: &str) -> String {
    let unwrapped = serde_json::from_str::<JsonValue>(text.trim())
        .ok()
        .and_then(|v| v.get("response")?.as_str().map(str::to_string));
    let text = unwrapped.as_deref().unwrap_or(text);

    if let Some(captures) = quoted_word_re().captures(text) {
        return captures[1].to_string();
    }

    text.split_whitespace()
        .next()
        .unwrap_or("")
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}

/// Classification-word normalization
///
/// Never fails: an unrecognized token degrades to `Intent::Action` with
/// a warning. Map actions are the most common path and the least
/// destructive to misroute into.
pub fn normalize_intent(text: &str) -> Intent {
    let token = extract_intent_token(text);
    match Intent::from_token(&token) {
        Some(intent) => intent,
        None => {
            tracing::warn!(token = %token, raw = %text, "unrecognized intent token, defaulting to ACTION");
            Intent::Action
        }
    }
}
