//! Saved conversations
//!
//! Each conversation is one pretty-printed JSON file, `<conversation_id>.json`,
//! in the conversations directory:
//!
//! ```json
//! {
//!   "conversation_id": "conv_20240131_154502",
//!   "timestamp": "2024-01-31T15:47:10Z",
//!   "metadata": { "created_at": "...", "model": "gpt-3.5-turbo", "message_count": 3, "blogs_written": 0 },
//!   "messages": [ { "role": "system", "content": "..." }, ... ]
//! }
//! ```

use chat_graph::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChatbotError, Result};
use crate::session::{ChatSession, SessionMetadata};

#[derive(Debug, Serialize, Deserialize)]
struct ConversationFile {
    conversation_id: String,
    timestamp: DateTime<Utc>,
    metadata: SessionMetadata,
    messages: Vec<Message>,
}

/// Directory of saved conversations
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, conversation_id: &str) -> Result<PathBuf> {
        let valid = !conversation_id.is_empty()
            && conversation_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ChatbotError::InvalidConversationId(conversation_id.to_string()));
        }
        Ok(self.dir.join(format!("{conversation_id}.json")))
    }

    /// Whether a conversation with this ID has been saved
    pub fn exists(&self, conversation_id: &str) -> bool {
        self.path_for(conversation_id)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Write the session, replacing any earlier save of it
    pub fn save(&self, session: &ChatSession) -> Result<PathBuf> {
        let path = self.path_for(&session.conversation_id)?;
        let file = ConversationFile {
            conversation_id: session.conversation_id.clone(),
            timestamp: Utc::now(),
            metadata: session.metadata.clone(),
            messages: session.messages().to_vec(),
        };

        std::fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        tracing::debug!(path = %path.display(), "Saved conversation");
        Ok(path)
    }

    /// Read a saved session
    pub fn load(&self, conversation_id: &str) -> Result<ChatSession> {
        let path = self.path_for(conversation_id)?;
        if !path.exists() {
            return Err(ChatbotError::ConversationNotFound(conversation_id.to_string()));
        }

        let file: ConversationFile = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        Ok(ChatSession::from_parts(file.conversation_id, file.messages, file.metadata))
    }

    /// IDs of saved conversations, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
