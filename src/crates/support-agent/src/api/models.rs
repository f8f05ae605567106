//! Request and response bodies

use chat_graph::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Explicit chat command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatCommand {
    Start,
    Resume,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub command: Option<ChatCommand>,
}

/// Outcome reported by `POST /chat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Interrupted,
    Completed,
    AlreadyCompleted,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub thread_id: String,
    pub status: ChatStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_input: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_complete: Option<bool>,
}

impl ChatReply {
    /// Thread paused on an interrupt with `prompt`
    pub fn interrupted(thread_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            status: ChatStatus::Interrupted,
            message: prompt.into(),
            requires_input: Some(true),
            messages: None,
            processing_complete: None,
        }
    }

    /// Thread finished by this request
    pub fn completed(thread_id: impl Into<String>, messages: Vec<Message>, processing_complete: bool) -> Self {
        Self {
            thread_id: thread_id.into(),
            status: ChatStatus::Completed,
            message: "Processing complete".to_string(),
            requires_input: Some(false),
            messages: Some(messages),
            processing_complete: Some(processing_complete),
        }
    }

    /// Thread had already finished before this request
    pub fn already_completed(thread_id: impl Into<String>, messages: Vec<Message>, processing_complete: bool) -> Self {
        Self {
            thread_id: thread_id.into(),
            status: ChatStatus::AlreadyCompleted,
            message: "This conversation has already been completed".to_string(),
            requires_input: None,
            messages: Some(messages),
            processing_complete: Some(processing_complete),
        }
    }
}

/// Response of `GET /threads/:id/state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadStateResponse {
    pub thread_id: String,
    pub state: Value,
    pub next_steps: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub step: Option<i32>,
    pub tasks: Vec<String>,
    /// Prompt of the pending interrupt, empty when none
    pub interrupt_message: String,
}

/// Response of `GET /threads`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadListResponse {
    pub threads: Vec<String>,
    pub count: usize,
}

impl ThreadListResponse {
    pub fn new(threads: Vec<String>) -> Self {
        Self {
            count: threads.len(),
            threads,
        }
    }
}

/// Response of `DELETE /threads/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteThreadResponse {
    pub message: String,
    pub deleted_checkpoints: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Checkpoint store backend
    pub store: String,
    /// Distinct threads started by this process
    pub total_threads: usize,
    /// Threads waiting for input
    pub active_threads: usize,
    pub thread_ids: Vec<String>,
    pub total_checkpoints: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            store: store.into(),
            total_threads: 0,
            active_threads: 0,
            thread_ids: Vec::new(),
            total_checkpoints: 0,
            database_path: None,
            timestamp: Utc::now(),
        }
    }
}

/// Render an interrupt payload as prompt text
pub fn prompt_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
