//! Chat messages shared by graph state, chat models and the CLI
//!
//! Messages are plain `{role, content}` records. The human role serializes as
//! `"user"` so histories can be handed to OpenAI-compatible endpoints as-is;
//! `"human"` is accepted on input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions or context for the model
    System,
    /// End-user input
    #[serde(rename = "user", alias = "human")]
    Human,
    /// Model output
    #[serde(alias = "ai")]
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::Human => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Check if this is a human message
    pub fn is_human(&self) -> bool {
        self.role == MessageRole::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_human_serializes_as_user() {
        let encoded = serde_json::to_value(Message::human("hi")).unwrap();
        assert_eq!(encoded, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_role_aliases() {
        let msg: Message = serde_json::from_value(json!({"role": "human", "content": "a"})).unwrap();
        assert!(msg.is_human());
        let msg: Message = serde_json::from_value(json!({"role": "ai", "content": "b"})).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        let msg: Message = serde_json::from_value(json!({"role": "system", "content": "c"})).unwrap();
        assert_eq!(msg, Message::system("c"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let res: Result<Message, _> = serde_json::from_value(json!({"role": "tool", "content": "x"}));
        assert!(res.is_err());
    }
}
