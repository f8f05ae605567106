//! Conversation sessions
//!
//! A [`ChatSession`] is one conversation: an ID, an append-only message
//! history starting with the system prompt, and a little metadata. Messages
//! are only ever pushed; starting over means creating a new session.

use chat_graph::{Message, MessageRole};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Default system prompt for interactive sessions
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Be conversational and engaging.";

/// System prompt used when blog mode is on
pub const BLOG_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant with blog writing capabilities using research and writing agents.";

/// Conversation ID prefix for blog mode sessions
pub const BLOG_ID_PREFIX: &str = "crewai_conv";

/// Build a conversation ID such as `conv_20240131_154502`
pub fn conversation_id(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Bookkeeping stored with a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub model: String,
    pub message_count: usize,
    #[serde(default)]
    pub blogs_written: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub demo_mode: bool,
}

/// One conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub conversation_id: String,
    messages: Vec<Message>,
    pub metadata: SessionMetadata,
}

impl ChatSession {
    /// New session seeded with a system prompt
    pub fn new(conversation_id: impl Into<String>, system_prompt: &str, model: impl Into<String>) -> Self {
        let mut session = Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            metadata: SessionMetadata {
                created_at: Utc::now(),
                last_updated: None,
                model: model.into(),
                message_count: 0,
                blogs_written: 0,
                demo_mode: false,
            },
        };
        session.messages.push(Message::system(system_prompt));
        session.metadata.message_count = session.messages.len();
        session
    }

    /// Rebuild a session from saved parts
    pub fn from_parts(conversation_id: String, messages: Vec<Message>, metadata: SessionMetadata) -> Self {
        Self {
            conversation_id,
            messages,
            metadata,
        }
    }

    /// Append a message and refresh the metadata
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.metadata.message_count = self.messages.len();
        self.metadata.last_updated = Some(Utc::now());
    }

    /// Record that the last reply was a blog post
    pub fn record_blog(&mut self) {
        self.metadata.blogs_written += 1;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages exchanged after the system prompt
    pub fn turn_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .count()
    }

    /// History formatted for display, one numbered entry per message
    pub fn format_history(&self) -> String {
        let mut out = String::from("\nConversation History:\n");
        out.push_str(&"-".repeat(50));
        out.push('\n');

        for (i, message) in self.messages.iter().enumerate() {
            let speaker = match message.role {
                MessageRole::Human => "You",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => "System",
            };
            out.push_str(&format!("{}. {}: {}\n\n", i + 1, speaker, message.content));
        }

        out.push_str(&format!("Total messages: {}\n", self.messages.len()));
        out.push_str(&format!("Conversation ID: {}\n", self.conversation_id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_conversation_id_format() {
        let at = Local.with_ymd_and_hms(2024, 1, 31, 15, 45, 2).unwrap();
        assert_eq!(conversation_id("conv", at), "conv_20240131_154502");
        assert_eq!(conversation_id("demo", at), "demo_20240131_154502");
    }

    #[test]
    fn test_new_session_has_system_prompt() {
        let session = ChatSession::new("conv_1", DEFAULT_SYSTEM_PROMPT, "gpt-3.5-turbo");
        assert_eq!(session.messages(), &[Message::system(DEFAULT_SYSTEM_PROMPT)]);
        assert_eq!(session.metadata.message_count, 1);
        assert_eq!(session.turn_count(), 0);
        assert!(session.metadata.last_updated.is_none());
    }

    #[test]
    fn test_push_is_append_only() {
        let mut session = ChatSession::new("conv_1", DEFAULT_SYSTEM_PROMPT, "gpt-3.5-turbo");
        session.push(Message::human("hi"));
        session.push(Message::assistant("hello"));

        assert_eq!(session.len(), 3);
        assert_eq!(session.messages()[1], Message::human("hi"));
        assert_eq!(session.messages()[2], Message::assistant("hello"));
        assert_eq!(session.metadata.message_count, 3);
        assert_eq!(session.turn_count(), 2);
        assert!(session.metadata.last_updated.is_some());
    }

    #[test]
    fn test_format_history() {
        let mut session = ChatSession::new("conv_1", "Be brief.", "m");
        session.push(Message::human("ping"));
        let history = session.format_history();
        assert!(history.contains("1. System: Be brief."));
        assert!(history.contains("2. You: ping"));
        assert!(history.contains("Total messages: 2"));
        assert!(history.contains("Conversation ID: conv_1"));
    }
}
