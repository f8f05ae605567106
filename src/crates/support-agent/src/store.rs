//! Checkpoint store selection

use std::sync::Arc;
use thread_checkpoint::{CheckpointSaver, InMemoryCheckpointSaver, Result, SqliteCheckpointSaver};

use crate::config::{StoreBackend, StoreConfig};

/// Open the configured checkpoint store
///
/// Returns the saver and, for SQLite, the database path it was opened at.
pub async fn open_store(config: &StoreConfig) -> Result<(Arc<dyn CheckpointSaver>, Option<String>)> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory checkpoint store; threads are lost on restart");
            Ok((Arc::new(InMemoryCheckpointSaver::new()), None))
        }
        StoreBackend::Sqlite => {
            let saver = SqliteCheckpointSaver::open(&config.path).await?;
            Ok((Arc::new(saver), Some(config.path.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        let (saver, path) = open_store(&config).await.unwrap();
        assert_eq!(saver.backend(), "memory");
        assert!(path.is_none());
    }

    #[tokio::test]
    async fn test_open_sqlite_store_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("checkpoints.db");
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            path: db_path.to_string_lossy().into_owned(),
        };

        let (saver, path) = open_store(&config).await.unwrap();
        assert_eq!(saver.backend(), "sqlite");
        assert_eq!(path.as_deref(), Some(config.path.as_str()));
        assert!(db_path.exists());
    }
}
