//! Critique extraction: AI response → [`Feedback`].
//!
//! The response content arrives either as a plain string or as a list of
//! content parts; [`crate::ai::MessageContent::text`] resolves that once. Models
//! sometimes wrap the JSON in a Markdown fence despite being told not to,
//! so an outer fence is stripped before parsing. Only JSON syntax is
//! checked; the shape is read leniently through [`Feedback`]'s accessors.

use crate::ai::AiResponse;
use crate::error::ReviewError;
use crate::record::Feedback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Critique text carried by the response.
pub fn feedback_text(response: &AiResponse) -> Result<&str, ReviewError> {
    response
        .message
        .content
        .text()
        .ok_or_else(|| ReviewError::FeedbackParse {
            detail: "response has no text content".into(),
        })
}

/// Extract and parse the critique.
pub fn extract_feedback(response: &AiResponse) -> Result<Feedback, ReviewError> {
    parse_feedback(feedback_text(response)?)
}

/// Parse critique text, tolerating an outer code fence.
pub fn parse_feedback(text: &str) -> Result<Feedback, ReviewError> {
    let body = strip_fence(text);
    debug!("Parsing {} bytes of feedback", body.len());
    let value: Value = serde_json::from_str(body).map_err(|e| ReviewError::FeedbackParse {
        detail: e.to_string(),
    })?;
    // `null` and `""` would read back as "still processing".
    let blank = match &value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if blank {
        return Err(ReviewError::FeedbackParse {
            detail: "critique is empty".into(),
        });
    }
    Ok(Feedback::from_value(value))
}

fn strip_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => trimmed,
    }
}
