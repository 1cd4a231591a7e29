//! Validation of raw backend output against the two-field response shape.

use serde_json::Value;
use thiserror::Error;

use crate::domain::models::{ContentType, StructuredResponse};

const CONTENT_TYPE_FIELD: &str = "contentType";
const CONTENT_FIELD: &str = "content";

/// Why a raw output was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("the response was empty")]
    Empty,

    #[error("the response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("the response must be a JSON object with 'contentType' and 'content'")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unexpected field '{0}'; only 'contentType' and 'content' are allowed")]
    UnexpectedField(String),

    #[error("{0}")]
    UnrecognizedContentType(String),
}

/// Text appended to the conversation after a rejected output.
pub fn correction_prompt(error: &ContractError) -> String {
    format!("That response did not match the expected format. Please try again. Error: {error}")
}

/// Strip a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the language tag on the opening line
    let inner = match inner.find('\n') {
        Some(newline) if !inner[..newline].contains('{') => &inner[newline + 1..],
        _ => strip_json_tag(inner),
    };
    inner.trim()
}

/// Drop a leading `json` tag, ignoring case.
fn strip_json_tag(inner: &str) -> &str {
    match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    }
}

/// Validator for the `{contentType, content}` response contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseContractValidator;

impl ResponseContractValidator {
    /// Parse raw output into a [`StructuredResponse`].
    ///
    /// `content` is taken verbatim when it is a string; any other JSON value
    /// is kept as its compact serialization.
    pub fn validate(raw: &str) -> Result<StructuredResponse, ContractError> {
        let text = strip_code_fence(raw);
        if text.is_empty() {
            return Err(ContractError::Empty);
        }

        let value: Value =
            serde_json::from_str(text).map_err(|e| ContractError::MalformedJson(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(ContractError::NotAnObject);
        };

        let content_type = object
            .remove(CONTENT_TYPE_FIELD)
            .ok_or(ContractError::MissingField(CONTENT_TYPE_FIELD))?;
        let content = object
            .remove(CONTENT_FIELD)
            .filter(|c| !c.is_null())
            .ok_or(ContractError::MissingField(CONTENT_FIELD))?;

        if let Some(extra) = object.keys().next() {
            return Err(ContractError::UnexpectedField(extra.clone()));
        }

        let content_type: ContentType = match content_type {
            Value::String(tag) => tag.parse().map_err(ContractError::UnrecognizedContentType)?,
            other => {
                return Err(ContractError::UnrecognizedContentType(format!(
                    "contentType must be a string, got {other}"
                )));
            }
        };

        let content = match content {
            Value::String(text) => text,
            other => other.to_string(),
        };

        Ok(StructuredResponse {
            content_type,
            content,
        })
    }
}
