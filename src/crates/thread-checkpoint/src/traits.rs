//! Storage trait for checkpoint backends
//!
//! [`CheckpointSaver`] is the seam between the graph runtime and whatever keeps
//! checkpoints around. Two backends ship with this crate:
//!
//! - [`InMemoryCheckpointSaver`](crate::InMemoryCheckpointSaver) - lost on restart
//! - [`SqliteCheckpointSaver`](crate::SqliteCheckpointSaver) - one SQLite file
//!
//! Checkpoints are append-only per thread. `put` never rewrites an existing
//! checkpoint; resuming a thread always adds new ones on top of the chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use thread_checkpoint::{CheckpointConfig, CheckpointSaver, InMemoryCheckpointSaver};
//!
//! let saver = InMemoryCheckpointSaver::new();
//! let config = CheckpointConfig::for_thread("session-1");
//!
//! if let Some(tuple) = saver.get_tuple(&config).await? {
//!     println!("next: {:?}", tuple.checkpoint.next);
//! }
//! ```

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

use crate::checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple, SaverStats};
use crate::error::Result;

/// Stream of checkpoint tuples returned by [`CheckpointSaver::list`]
pub type CheckpointStream =
    Pin<Box<dyn Stream<Item = Result<CheckpointTuple>> + Send + 'static>>;

/// Core trait for checkpoint storage backends
///
/// Every operation addressing a thread requires `config.thread_id`; backends
/// return [`CheckpointError::Invalid`](crate::CheckpointError::Invalid) when it
/// is missing.
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Short backend name reported by health endpoints ("memory", "sqlite")
    fn backend(&self) -> &'static str;

    /// Fetch a checkpoint using the given configuration
    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>> {
        Ok(self.get_tuple(config).await?.map(|tuple| tuple.checkpoint))
    }

    /// Fetch a checkpoint tuple
    ///
    /// With `checkpoint_id` set, that exact checkpoint is returned; otherwise
    /// the latest checkpoint of the thread.
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>>;

    /// List the checkpoints of a thread, newest first
    async fn list(&self, config: &CheckpointConfig, limit: Option<usize>) -> Result<CheckpointStream>;

    /// Append a checkpoint to a thread
    ///
    /// The parent of the new checkpoint is `config.checkpoint_id`, if any.
    /// Returns a config addressing the stored checkpoint.
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig>;

    /// Distinct thread IDs, most recently written first
    async fn list_threads(&self) -> Result<Vec<String>>;

    /// Delete every checkpoint of a thread, returning how many were removed
    async fn delete_thread(&self, thread_id: &str) -> Result<usize>;

    /// Thread and checkpoint totals
    async fn stats(&self) -> Result<SaverStats>;
}
