//! Best-effort mapping of free submission text onto schema fields.
//!
//! The extraction call is an outside collaborator: whatever it returns is handed to the
//! normalizer as an ordinary submission. Failures never propagate; they become an
//! `{"error": "..."}` object that flows through like any other data.

mod openai;
mod prompt;

pub use openai::OpenAiExtractor;
pub use prompt::build_prompt;

use std::future::Future;

use serde_json::{json, Map, Value};

use super::schema::Schema;

pub const EXTRACTION_ERROR_KEY: &str = "error";

/// Source of field/value mappings for unstructured submissions.
pub trait SubmissionExtractor: Send + Sync {
    /// Always resolves to a JSON object; failures use [`failure_payload`].
    fn extract(&self, text: &str, schema: &Schema) -> impl Future<Output = Value> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned no completion")]
    EmptyCompletion,
    #[error("completion is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("completion is JSON but not an object")]
    NotAnObject,
}

/// Error object handed downstream in place of extracted fields.
pub fn failure_payload(error: &ExtractionError) -> Value {
    json!({ EXTRACTION_ERROR_KEY: format!("LLM extraction failed: {error}") })
}

/// Message carried by a failure payload, if `value` is one.
pub fn failure_message(value: &Value) -> Option<&str> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get(EXTRACTION_ERROR_KEY).and_then(Value::as_str)
}

/// Parses a model reply into a field map. Surrounding whitespace and a Markdown code
/// fence are tolerated.
pub fn parse_completion(content: &str) -> Result<Map<String, Value>, ExtractionError> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyCompletion);
    }

    match serde_json::from_str::<Value>(trimmed)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(ExtractionError::NotAnObject),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
