//! UI-agnostic conversation types
//!
//! Shared between the session controller and whatever front end renders it.
//! Nothing in here depends on a UI framework.

use serde::{Deserialize, Serialize};

/// A single turn entry in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::assistant("hola");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hola"}"#);
    }

    #[test]
    fn test_constructors_set_role() {
        assert_eq!(ChatMessage::user("a").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("b").role, ChatRole::Assistant);
    }
}
