//! Access credential and per-turn context.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bearer token for the remote planner/mail API.
///
/// Acquired and refreshed outside this crate; treated as opaque here.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// State that belongs to a single turn and is passed explicitly to operations.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub conversation_id: Uuid,
    pub token: AccessToken,
    /// Reference time for overdue checks.
    pub now: DateTime<Utc>,
}

impl TurnContext {
    pub fn new(token: AccessToken, now: DateTime<Utc>) -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            token,
            now,
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: Uuid) -> Self {
        self.conversation_id = conversation_id;
        self
    }
}
