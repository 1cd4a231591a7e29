//! Conversation history owned by the caller and extended during a turn.

use serde::{Deserialize, Serialize};

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Append-only record of a conversation.
///
/// Discarded malformed generations and correction prompts stay in the
/// history so the exchange can be audited afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: Vec<ChatTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(ChatTurn::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(ChatTurn::assistant(text));
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns written by the given role, oldest first.
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter().filter(move |turn| turn.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_preserves_order() {
        let mut history = ConversationHistory::new();
        history.push_user("list my tasks");
        history.push_assistant("{\"contentType\":\"Text\"");
        history.push_assistant(",\"content\":\"none\"}");

        assert_eq!(history.len(), 3);
        assert_eq!(history.turns()[0], ChatTurn::user("list my tasks"));
        assert_eq!(history.by_role(Role::Assistant).count(), 2);
        assert_eq!(history.last().map(|t| t.role), Some(Role::Assistant));
    }

    #[test]
    fn test_history_serializes_as_plain_list() {
        let mut history = ConversationHistory::new();
        history.push_user("hi");
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"[{"role":"user","text":"hi"}]"#);

        let back: ConversationHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
