//! The two-shape response handed back to the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// MIME type callers attach to card payloads.
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// How `content` is meant to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Plain text.
    Text,
    /// Serialized Adaptive Card JSON, passed through untouched.
    AdaptiveCard,
}

impl ContentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::AdaptiveCard => "AdaptiveCard",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    /// Case-insensitive match against the two recognized tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else if s.eq_ignore_ascii_case("adaptivecard") {
            Ok(Self::AdaptiveCard)
        } else {
            Err(format!(
                "unrecognized contentType '{s}', expected 'Text' or 'AdaptiveCard'"
            ))
        }
    }
}

/// A validated response from the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResponse {
    pub content_type: ContentType,
    pub content: String,
}

impl StructuredResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            content: content.into(),
        }
    }

    pub fn adaptive_card(content: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::AdaptiveCard,
            content: content.into(),
        }
    }

    pub fn is_card(&self) -> bool {
        self.content_type == ContentType::AdaptiveCard
    }
}
