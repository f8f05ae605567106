//! # thread-checkpoint
//!
//! Per-thread checkpoint persistence for interruptible conversations.
//!
//! Each conversation thread owns an append-only chain of [`Checkpoint`]s.
//! A checkpoint records the full state object, the nodes scheduled to run
//! next and any interrupt payloads still awaiting a human answer, which is
//! everything a graph runtime needs to pause a run and pick it up again later,
//! possibly in another process.
//!
//! ## Backends
//!
//! - [`InMemoryCheckpointSaver`] - shared `Arc<RwLock<HashMap>>`, gone on restart
//! - [`SqliteCheckpointSaver`] - single SQLite file via `sqlx`, survives restarts
//!
//! Both implement [`CheckpointSaver`], so callers hold an
//! `Arc<dyn CheckpointSaver>` and pick the backend from configuration.
//!
//! ## Example
//!
//! ```rust,ignore
//! use thread_checkpoint::*;
//! use serde_json::json;
//!
//! let saver = SqliteCheckpointSaver::open("data/checkpoints.db").await?;
//! let config = CheckpointConfig::for_thread("session-1");
//!
//! let checkpoint = Checkpoint::new(json!({"messages": []}), vec!["request_input".into()]);
//! let metadata = CheckpointMetadata::new().with_source(CheckpointSource::Input).with_step(-1);
//! saver.put(&config, checkpoint, metadata).await?;
//!
//! assert_eq!(saver.list_threads().await?, vec!["session-1"]);
//! ```

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointId, CheckpointMetadata, CheckpointSource,
    CheckpointTuple, PendingInterrupt, SaverStats,
};
pub use error::{CheckpointError, Result};
pub use memory::InMemoryCheckpointSaver;
pub use sqlite::SqliteCheckpointSaver;
pub use traits::{CheckpointSaver, CheckpointStream};
