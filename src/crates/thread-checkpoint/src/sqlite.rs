//! SQLite-backed checkpoint storage
//!
//! Checkpoints live in a single `checkpoints` table created by the embedded
//! migrations. The checkpoint and its metadata are stored as JSON text; the
//! autoincrement `seq` column preserves insertion order.

use async_trait::async_trait;
use futures::stream;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple, SaverStats};
use crate::error::Result;
use crate::traits::{CheckpointSaver, CheckpointStream};

type CheckpointRow = (String, String, Option<String>, String, String);

const SELECT_COLUMNS: &str =
    "SELECT thread_id, checkpoint_id, parent_checkpoint_id, checkpoint, metadata FROM checkpoints";

/// Checkpoint saver persisting to a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteCheckpointSaver {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl SqliteCheckpointSaver {
    /// Open (or create) the database at `path` and run migrations
    ///
    /// Missing parent directories are created.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        debug!(path = %path.display(), "Connecting to checkpoint database");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let saver = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        saver.run_migrations().await?;

        info!(path = %path.display(), "Checkpoint database ready");
        Ok(saver)
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        // Every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let saver = Self { pool, path: None };
        saver.run_migrations().await?;
        Ok(saver)
    }

    /// Path of the database file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_tuple(row: CheckpointRow) -> Result<CheckpointTuple> {
        let (thread_id, checkpoint_id, parent_id, checkpoint, metadata) = row;

        let checkpoint: Checkpoint = serde_json::from_str(&checkpoint)?;
        let metadata: CheckpointMetadata = serde_json::from_str(&metadata)?;

        let config = CheckpointConfig::for_thread(thread_id.clone()).with_checkpoint_id(checkpoint_id);
        let mut tuple = CheckpointTuple::new(config, checkpoint, metadata);
        if let Some(parent_id) = parent_id {
            tuple = tuple.with_parent_config(
                CheckpointConfig::for_thread(thread_id).with_checkpoint_id(parent_id),
            );
        }
        Ok(tuple)
    }
}

#[async_trait]
impl CheckpointSaver for SqliteCheckpointSaver {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config.require_thread_id()?;

        let row: Option<CheckpointRow> = match &config.checkpoint_id {
            Some(checkpoint_id) => {
                sqlx::query_as(&format!(
                    "{SELECT_COLUMNS} WHERE thread_id = ? AND checkpoint_id = ?"
                ))
                .bind(thread_id)
                .bind(checkpoint_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{SELECT_COLUMNS} WHERE thread_id = ? ORDER BY seq DESC LIMIT 1"
                ))
                .bind(thread_id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(Self::row_to_tuple).transpose()
    }

    async fn list(&self, config: &CheckpointConfig, limit: Option<usize>) -> Result<CheckpointStream> {
        let thread_id = config.require_thread_id()?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let rows: Vec<CheckpointRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE thread_id = ? ORDER BY seq DESC LIMIT ?"
        ))
        .bind(thread_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let results: Vec<Result<CheckpointTuple>> = rows.into_iter().map(Self::row_to_tuple).collect();
        Ok(Box::pin(stream::iter(results)))
    }

    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig> {
        let thread_id = config.require_thread_id()?;

        let checkpoint_json = serde_json::to_string(&checkpoint)?;
        let metadata_json = serde_json::to_string(&metadata)?;

        sqlx::query(
            "INSERT INTO checkpoints (thread_id, checkpoint_id, parent_checkpoint_id, checkpoint, metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(thread_id)
        .bind(&checkpoint.id)
        .bind(&config.checkpoint_id)
        .bind(&checkpoint_json)
        .bind(&metadata_json)
        .bind(checkpoint.ts.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(thread_id, checkpoint_id = %checkpoint.id, "Stored checkpoint");

        Ok(CheckpointConfig::for_thread(thread_id).with_checkpoint_id(checkpoint.id))
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT thread_id FROM checkpoints GROUP BY thread_id ORDER BY MAX(seq) DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<usize> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn stats(&self) -> Result<SaverStats> {
        let (threads, checkpoints): (i64, i64) =
            sqlx::query_as("SELECT COUNT(DISTINCT thread_id), COUNT(*) FROM checkpoints")
                .fetch_one(&self.pool)
                .await?;

        Ok(SaverStats {
            threads: threads as usize,
            checkpoints: checkpoints as usize,
        })
    }
}
