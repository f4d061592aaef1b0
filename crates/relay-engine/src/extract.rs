//! Best-effort text extraction from untyped pipeline results.
//!
//! Order of precedence:
//! 1. a bare JSON string
//! 2. `data[0].segments[0].response`, fetched first when `is_url` is set
//! 3. the first string under one of [`ANSWER_KEYS`]
//! 4. (`extract_or_dump` only) the whole value serialized as JSON

use relay_core::{preview, Upstream};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Top-level keys that carry the answer, in the order they are tried.
pub const ANSWER_KEYS: [&str; 6] = ["response", "output", "result", "text", "content", "generated_text"];

/// How the first segment of `data[0].segments` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentMode {
    /// URL segments are fetched, plain text segments are returned as-is.
    #[default]
    UrlOrText,
    /// Only URL segments are honoured; plain text falls through to the key scan.
    UrlOnly,
}

pub async fn extract(value: &Value, upstream: &dyn Upstream, mode: SegmentMode) -> Option<String> {
    if let Value::String(s) = value {
        return Some(s.clone());
    }

    if let Some(text) = from_segment(value, upstream, mode).await {
        return Some(text);
    }

    from_answer_keys(value)
}

/// Like [`extract`], but falls back to the serialized value instead of `None`.
pub async fn extract_or_dump(value: &Value, upstream: &dyn Upstream, mode: SegmentMode) -> String {
    match extract(value, upstream, mode).await {
        Some(text) => text,
        None => {
            debug!("No known answer field, returning raw result");
            value.to_string()
        }
    }
}

fn first_segment(value: &Value) -> Option<&Map<String, Value>> {
    value
        .get("data")?
        .as_array()?
        .first()?
        .get("segments")?
        .as_array()?
        .first()?
        .as_object()
}

async fn from_segment(value: &Value, upstream: &dyn Upstream, mode: SegmentMode) -> Option<String> {
    let segment = first_segment(value)?;
    let response = segment.get("response")?.as_str()?;
    let is_url = segment.get("is_url").is_some_and(is_truthy);

    if !is_url {
        return match mode {
            SegmentMode::UrlOrText => {
                debug!("Found text response: {}", preview(response, 100));
                Some(response.to_string())
            }
            SegmentMode::UrlOnly => None,
        };
    }

    match upstream.fetch_text(response).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to fetch text from URL {}: {}", response, e);
            None
        }
    }
}

/// Loose flag reading: `true`, non-zero numbers and non-empty strings,
/// arrays or objects all count as set.
fn is_truthy(flag: &Value) -> bool {
    match flag {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn from_answer_keys(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    ANSWER_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(String::from)
}
