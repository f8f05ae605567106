//! Process-local session bookkeeping
//!
//! The checkpoint store owns conversation state; the registry only records
//! which threads this process has seen, when, and whether they finished. It
//! feeds the health summary and is never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Paused on an interrupt
    AwaitingInput,
    /// Final reply produced
    Completed,
}

/// Bookkeeping for one thread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: SessionStatus,
    /// Number of resumes processed
    pub turns: u32,
    /// Prompt of the pending interrupt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_message: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, SessionInfo>,
    /// Every ID ever started, including deleted ones
    created: HashSet<String>,
}

/// Shared registry of sessions seen by this process
#[derive(Debug, Clone, Default)]
pub struct ThreadRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly started thread waiting on `interrupt_message`
    ///
    /// Returns true the first time an ID is started. A thread that is already
    /// registered is refreshed instead; one started again after a delete gets
    /// a new entry but is not counted twice.
    pub async fn record_start(&self, thread_id: &str, interrupt_message: Option<String>) -> bool {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        if let Some(info) = inner.sessions.get_mut(thread_id) {
            info.last_seen = now;
            info.status = SessionStatus::AwaitingInput;
            info.interrupt_message = interrupt_message;
            return false;
        }

        inner.sessions.insert(
            thread_id.to_string(),
            SessionInfo {
                created_at: now,
                last_seen: now,
                status: SessionStatus::AwaitingInput,
                turns: 0,
                interrupt_message,
            },
        );
        inner.created.insert(thread_id.to_string())
    }

    /// Record a resume of `thread_id`
    ///
    /// Threads restored from a persistent store are registered on first sight.
    pub async fn record_resume(&self, thread_id: &str, completed: bool) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        let info = inner
            .sessions
            .entry(thread_id.to_string())
            .or_insert_with(|| SessionInfo {
                created_at: now,
                last_seen: now,
                status: SessionStatus::AwaitingInput,
                turns: 0,
                interrupt_message: None,
            });

        info.last_seen = now;
        info.turns += 1;
        if completed {
            info.status = SessionStatus::Completed;
            info.interrupt_message = None;
        }
    }

    /// Refresh `last_seen` for a thread
    pub async fn touch(&self, thread_id: &str) {
        if let Some(info) = self.inner.write().await.sessions.get_mut(thread_id) {
            info.last_seen = Utc::now();
        }
    }

    pub async fn get(&self, thread_id: &str) -> Option<SessionInfo> {
        self.inner.read().await.sessions.get(thread_id).cloned()
    }

    /// Drop a thread's entry; `created_total` is unaffected
    pub async fn remove(&self, thread_id: &str) -> Option<SessionInfo> {
        self.inner.write().await.sessions.remove(thread_id)
    }

    /// Number of distinct thread IDs started by this process
    pub async fn created_total(&self) -> usize {
        self.inner.read().await.created.len()
    }

    /// IDs of threads waiting for input, most recently seen first
    pub async fn active_thread_ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut active: Vec<(&String, &SessionInfo)> = inner
            .sessions
            .iter()
            .filter(|(_, info)| info.status == SessionStatus::AwaitingInput)
            .collect();
        active.sort_by(|a, b| b.1.last_seen.cmp(&a.1.last_seen).then_with(|| a.0.cmp(b.0)));
        active.into_iter().map(|(id, _)| id.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
