//! In-memory checkpoint storage
//!
//! [`InMemoryCheckpointSaver`] keeps every thread's checkpoints in an
//! `Arc<RwLock<HashMap>>`. Cloning the saver shares the same storage, so one
//! instance can back a whole server process. Nothing survives a restart.
//!
//! ```text
//! thread_id: "session-1"
//!   ├─ [0] CheckpointEntry (step -1, seq 0)
//!   ├─ [1] CheckpointEntry (step 0,  seq 1)
//!   └─ [2] CheckpointEntry (step 1,  seq 4)
//! thread_id: "session-2"
//!   ├─ [0] CheckpointEntry (step -1, seq 2)
//!   └─ [1] CheckpointEntry (step 0,  seq 3)
//! ```
//!
//! `seq` is a process-wide write counter used to order threads by their most
//! recent write.

use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple, SaverStats};
use crate::error::Result;
use crate::traits::{CheckpointSaver, CheckpointStream};

#[derive(Debug, Clone)]
struct CheckpointEntry {
    seq: u64,
    checkpoint: Checkpoint,
    metadata: CheckpointMetadata,
    config: CheckpointConfig,
    parent_config: Option<CheckpointConfig>,
}

impl CheckpointEntry {
    fn to_tuple(&self) -> CheckpointTuple {
        CheckpointTuple {
            config: self.config.clone(),
            checkpoint: self.checkpoint.clone(),
            metadata: self.metadata.clone(),
            parent_config: self.parent_config.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Storage {
    next_seq: u64,
    threads: HashMap<String, Vec<CheckpointEntry>>,
}

/// In-memory checkpoint saver
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointSaver {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryCheckpointSaver {
    /// Create a new in-memory checkpoint saver
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of threads being tracked
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.threads.len()
    }

    /// Get the total number of checkpoints across all threads
    pub async fn checkpoint_count(&self) -> usize {
        self.storage
            .read()
            .await
            .threads
            .values()
            .map(|entries| entries.len())
            .sum()
    }

    /// Clear all checkpoints
    pub async fn clear(&self) {
        self.storage.write().await.threads.clear();
    }
}

#[async_trait]
impl CheckpointSaver for InMemoryCheckpointSaver {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config.require_thread_id()?;
        let storage = self.storage.read().await;

        let Some(entries) = storage.threads.get(thread_id) else {
            return Ok(None);
        };

        let entry = match &config.checkpoint_id {
            Some(checkpoint_id) => entries.iter().find(|e| &e.checkpoint.id == checkpoint_id),
            None => entries.last(),
        };

        Ok(entry.map(CheckpointEntry::to_tuple))
    }

    async fn list(&self, config: &CheckpointConfig, limit: Option<usize>) -> Result<CheckpointStream> {
        let thread_id = config.require_thread_id()?;
        let storage = self.storage.read().await;

        let results: Vec<Result<CheckpointTuple>> = storage
            .threads
            .get(thread_id)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|entry| Ok(entry.to_tuple()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Box::pin(stream::iter(results)))
    }

    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig> {
        let thread_id = config.require_thread_id()?.to_string();

        let mut storage = self.storage.write().await;
        let seq = storage.next_seq;
        storage.next_seq += 1;

        let checkpoint_config = CheckpointConfig::for_thread(thread_id.clone())
            .with_checkpoint_id(checkpoint.id.clone());

        let entry = CheckpointEntry {
            seq,
            checkpoint,
            metadata,
            config: checkpoint_config.clone(),
            parent_config: config.checkpoint_id.as_ref().map(|_| config.clone()),
        };

        storage.threads.entry(thread_id).or_default().push(entry);

        Ok(checkpoint_config)
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let storage = self.storage.read().await;

        let mut threads: Vec<(u64, &String)> = storage
            .threads
            .iter()
            .filter_map(|(id, entries)| entries.last().map(|e| (e.seq, id)))
            .collect();
        threads.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(threads.into_iter().map(|(_, id)| id.clone()).collect())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<usize> {
        let mut storage = self.storage.write().await;
        Ok(storage
            .threads
            .remove(thread_id)
            .map(|entries| entries.len())
            .unwrap_or(0))
    }

    async fn stats(&self) -> Result<SaverStats> {
        let storage = self.storage.read().await;
        Ok(SaverStats {
            threads: storage.threads.len(),
            checkpoints: storage.threads.values().map(Vec::len).sum(),
        })
    }
}
