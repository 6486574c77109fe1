// file: src/generation/response.rs
// description: normalization of heterogeneous model responses to plain text
// reference: https://docs.rs/serde_json/latest/serde_json/enum.Value.html

use crate::error::Result;
use serde_json::Value;
use std::fmt;
use tracing::warn;

pub type TextAccessor = Box<dyn FnOnce() -> Result<String> + Send>;

/// What a generation call hands back before normalization.
pub enum RawResponse {
    /// A JSON body: candidate/parts, chat completion, or a bare `text` field.
    Structured(Value),
    /// Deferred text, read on demand.
    Accessor(TextAccessor),
    Text(String),
}

impl RawResponse {
    pub fn accessor<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        RawResponse::Accessor(Box::new(f))
    }

    /// Never fails: unrecognized shapes become an empty string.
    pub fn into_text(self) -> String {
        match self {
            RawResponse::Text(text) => text,
            RawResponse::Structured(value) => match text_from_value(&value) {
                Some(text) => text,
                None => {
                    warn!("Unrecognized model response shape, treating as empty");
                    String::new()
                }
            },
            RawResponse::Accessor(read) => match read() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Response text accessor failed: {}", e);
                    String::new()
                }
            },
        }
    }
}

fn text_from_value(value: &Value) -> Option<String> {
    if let Some(parts) = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(content) = value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        return Some(content.to_string());
    }

    if let Some(text) = value.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    value.as_str().map(str::to_string)
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawResponse::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
            RawResponse::Accessor(_) => f.write_str("Accessor(..)"),
            RawResponse::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        RawResponse::Text(text)
    }
}

impl From<&str> for RawResponse {
    fn from(text: &str) -> Self {
        RawResponse::Text(text.to_string())
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        RawResponse::Structured(value)
    }
}
