//! Core checkpoint data structures
//!
//! A [`Checkpoint`] is a point-in-time snapshot of one conversation thread:
//! the full state object, the nodes still scheduled to run, and any interrupt
//! payloads waiting for human input. Checkpoints of a thread form an
//! append-only chain linked through [`CheckpointTuple::parent_config`].
//!
//! ```text
//! thread "3f2c…"
//!   [0] source=input  step=-1  next=["request_input"]
//!   [1] source=loop   step=0   next=["request_input"]  interrupts=[…]
//!   [2] source=resume step=1   next=[]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{CheckpointError, Result};

/// Checkpoint ID type
pub type CheckpointId = String;

/// An interrupt raised inside a node that has not been resumed yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingInterrupt {
    /// Unique ID of this interrupt
    pub id: String,
    /// Node that raised the interrupt
    pub node: String,
    /// Payload handed to the caller (usually a prompt)
    pub value: Value,
}

impl PendingInterrupt {
    /// Create a pending interrupt with a fresh ID
    pub fn new(node: impl Into<String>, value: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node: node.into(),
            value,
        }
    }
}

/// Where a checkpoint came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Written from the input to a new run
    Input,
    /// Written from inside the execution loop
    Loop,
    /// Written after a node resumed from an interrupt
    Resume,
    /// Written from a manual state update
    Update,
}

/// Metadata associated with a checkpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CheckpointMetadata {
    /// The source of the checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckpointSource>,

    /// The step number of the checkpoint
    /// -1 for the first "input" checkpoint
    /// 0 for the first "loop" checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<i32>,

    /// Additional custom metadata
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl CheckpointMetadata {
    /// Create a new checkpoint metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source
    pub fn with_source(mut self, source: CheckpointSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the step number
    pub fn with_step(mut self, step: i32) -> Self {
        self.step = Some(step);
        self
    }

    /// Add custom metadata
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// State snapshot of a thread at a given point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// The version of the checkpoint format
    pub v: i32,

    /// The ID of the checkpoint
    pub id: CheckpointId,

    /// The timestamp of the checkpoint
    pub ts: DateTime<Utc>,

    /// Full state object at the time of the checkpoint
    pub values: Value,

    /// Nodes scheduled to run next; empty once the run has finished
    #[serde(default)]
    pub next: Vec<String>,

    /// Interrupts awaiting a resume value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interrupts: Vec<PendingInterrupt>,
}

impl Checkpoint {
    /// Current checkpoint format version
    pub const CURRENT_VERSION: i32 = 1;

    /// Create a new checkpoint with a fresh ID
    pub fn new(values: Value, next: Vec<String>) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id: Uuid::new_v4().to_string(),
            ts: Utc::now(),
            values,
            next,
            interrupts: Vec::new(),
        }
    }

    /// Create an empty checkpoint
    pub fn empty() -> Self {
        Self::new(Value::Object(Default::default()), Vec::new())
    }

    /// Attach pending interrupts
    pub fn with_interrupts(mut self, interrupts: Vec<PendingInterrupt>) -> Self {
        self.interrupts = interrupts;
        self
    }

    /// Whether execution is paused waiting for input
    pub fn is_interrupted(&self) -> bool {
        !self.interrupts.is_empty()
    }
}

/// Configuration addressing a thread, optionally a specific checkpoint in it
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CheckpointConfig {
    /// Thread ID grouping related checkpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Specific checkpoint ID to retrieve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<CheckpointId>,
}

impl CheckpointConfig {
    /// Create a new checkpoint configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a config pointing at the latest checkpoint of a thread
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self::new().with_thread_id(thread_id)
    }

    /// Set the thread ID
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Set the checkpoint ID
    pub fn with_checkpoint_id(mut self, checkpoint_id: impl Into<CheckpointId>) -> Self {
        self.checkpoint_id = Some(checkpoint_id.into());
        self
    }

    /// Thread ID, or an error when the config doesn't name one
    pub fn require_thread_id(&self) -> Result<&str> {
        self.thread_id
            .as_deref()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))
    }
}

/// A checkpoint together with its addressing and metadata
#[derive(Debug, Clone)]
pub struct CheckpointTuple {
    /// Configuration for this checkpoint
    pub config: CheckpointConfig,

    /// The checkpoint itself
    pub checkpoint: Checkpoint,

    /// Metadata associated with the checkpoint
    pub metadata: CheckpointMetadata,

    /// Parent configuration (if any)
    pub parent_config: Option<CheckpointConfig>,
}

impl CheckpointTuple {
    /// Create a new checkpoint tuple
    pub fn new(config: CheckpointConfig, checkpoint: Checkpoint, metadata: CheckpointMetadata) -> Self {
        Self {
            config,
            checkpoint,
            metadata,
            parent_config: None,
        }
    }

    /// Set the parent configuration
    pub fn with_parent_config(mut self, parent_config: CheckpointConfig) -> Self {
        self.parent_config = Some(parent_config);
        self
    }
}

/// Aggregate counts reported by a saver
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaverStats {
    /// Number of distinct threads
    pub threads: usize,
    /// Number of checkpoints across all threads
    pub checkpoints: usize,
}
