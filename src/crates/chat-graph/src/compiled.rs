//! Compiled graph execution
//!
//! [`CompiledGraph`] runs nodes one after another along the validated chain,
//! merging each node's update into the state and writing a checkpoint after
//! the input and after every node.
//!
//! ```text
//! stream(State)                          stream(Command::resume(v))
//!   put(source=input, step=-1)             get_tuple(thread) -> next=[n]
//!   n(state, ctx)                          n(state, ctx{resume: v})
//!     └─ ctx.interrupt(p) -> Err             └─ ctx.interrupt(p) -> Ok(v)
//!   put(step=0, next=[n], interrupts=[p])  put(source=resume, step=1, next=[..])
//!   -> [Interrupt{p}]                      -> [Update{n, ..}, ...]
//! ```

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thread_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver, CheckpointSource,
    CheckpointTuple, PendingInterrupt,
};
use tracing::{debug, info};

use crate::builder::NodeFn;
use crate::command::Command;
use crate::error::{GraphError, Result};
use crate::interrupt::NodeContext;
use crate::state::StateSchema;

/// Default cap on node executions per call
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Input to a graph run
#[derive(Debug, Clone)]
pub enum GraphInput {
    /// Start a run from the entry node, merging this object into the state
    State(Value),
    /// Resume the thread's pending node
    Command(Command),
}

impl From<Command> for GraphInput {
    fn from(command: Command) -> Self {
        GraphInput::Command(command)
    }
}

/// Event emitted while a run progresses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A node finished and produced this update
    Update {
        /// Node name
        node: String,
        /// The update returned by the node
        values: Value,
    },
    /// A node paused waiting for input; the run stops here
    Interrupt {
        /// Interrupt ID
        id: String,
        /// Node that raised it
        node: String,
        /// Payload for the caller
        value: Value,
    },
}

impl StreamEvent {
    /// Interrupt payload, if this is an interrupt event
    pub fn as_interrupt(&self) -> Option<&Value> {
        match self {
            StreamEvent::Interrupt { value, .. } => Some(value),
            StreamEvent::Update { .. } => None,
        }
    }
}

/// Node scheduled in a snapshot, with its pending interrupts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTask {
    /// Node name
    pub name: String,
    /// Interrupts raised by this node awaiting a resume
    pub interrupts: Vec<PendingInterrupt>,
}

/// Thread state at one checkpoint
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Full state object
    pub values: Value,
    /// Nodes scheduled to run next; empty when the run has finished
    pub next: Vec<String>,
    /// Config addressing this checkpoint
    pub config: CheckpointConfig,
    /// Checkpoint metadata
    pub metadata: CheckpointMetadata,
    /// When the checkpoint was written
    pub created_at: DateTime<Utc>,
    /// Step number of the checkpoint
    pub step: Option<i32>,
    /// Scheduled nodes
    pub tasks: Vec<StateTask>,
    /// All pending interrupts
    pub interrupts: Vec<PendingInterrupt>,
    /// Previous checkpoint in the chain
    pub parent_config: Option<CheckpointConfig>,
}

impl StateSnapshot {
    /// Whether the thread is paused waiting for input
    pub fn is_interrupted(&self) -> bool {
        !self.next.is_empty()
    }

    fn from_tuple(tuple: CheckpointTuple) -> Self {
        let CheckpointTuple {
            config,
            checkpoint,
            metadata,
            parent_config,
        } = tuple;

        let tasks = checkpoint
            .next
            .iter()
            .map(|name| StateTask {
                name: name.clone(),
                interrupts: checkpoint
                    .interrupts
                    .iter()
                    .filter(|i| &i.node == name)
                    .cloned()
                    .collect(),
            })
            .collect();

        Self {
            values: checkpoint.values,
            next: checkpoint.next,
            config,
            step: metadata.step,
            metadata,
            created_at: checkpoint.ts,
            tasks,
            interrupts: checkpoint.interrupts,
            parent_config,
        }
    }
}

struct RunOutput {
    events: Vec<StreamEvent>,
    values: Value,
}

/// Executable graph produced by [`StateGraph`](crate::StateGraph)
#[derive(Clone)]
pub struct CompiledGraph {
    nodes: HashMap<String, NodeFn>,
    order: Vec<String>,
    entry: String,
    successors: HashMap<String, String>,
    schema: StateSchema,
    saver: Option<Arc<dyn CheckpointSaver>>,
    recursion_limit: usize,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("nodes", &self.order)
            .field("entry", &self.entry)
            .field("checkpointer", &self.saver.as_ref().map(|s| s.backend()))
            .finish()
    }
}

impl CompiledGraph {
    pub(crate) fn new(
        nodes: HashMap<String, NodeFn>,
        order: Vec<String>,
        entry: String,
        successors: HashMap<String, String>,
        schema: StateSchema,
        saver: Option<Arc<dyn CheckpointSaver>>,
    ) -> Self {
        Self {
            nodes,
            order,
            entry,
            successors,
            schema,
            saver,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Override the maximum number of node executions per call
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// First node after START
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Node names in insertion order
    pub fn node_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// The attached checkpoint saver
    pub fn checkpointer(&self) -> Option<&Arc<dyn CheckpointSaver>> {
        self.saver.as_ref()
    }

    /// Run the graph and return the update-mode events
    ///
    /// Stops after the first interrupt; the thread can then be resumed with
    /// `GraphInput::Command(Command::resume(..))`.
    pub async fn stream(&self, input: GraphInput, config: &CheckpointConfig) -> Result<Vec<StreamEvent>> {
        Ok(self.run(input, config).await?.events)
    }

    /// Run the graph and return the resulting state
    pub async fn invoke(&self, input: GraphInput, config: &CheckpointConfig) -> Result<Value> {
        Ok(self.run(input, config).await?.values)
    }

    /// Latest snapshot of a thread, or `None` if it has no checkpoints
    pub async fn get_state(&self, config: &CheckpointConfig) -> Result<Option<StateSnapshot>> {
        let saver = self.require_saver()?;
        Ok(saver.get_tuple(config).await?.map(StateSnapshot::from_tuple))
    }

    /// Snapshots of a thread, newest first
    pub async fn get_state_history(
        &self,
        config: &CheckpointConfig,
        limit: Option<usize>,
    ) -> Result<Vec<StateSnapshot>> {
        let saver = self.require_saver()?;
        let mut stream = saver.list(config, limit).await?;

        let mut snapshots = Vec::new();
        while let Some(tuple) = stream.next().await {
            snapshots.push(StateSnapshot::from_tuple(tuple?));
        }
        Ok(snapshots)
    }

    fn require_saver(&self) -> Result<&Arc<dyn CheckpointSaver>> {
        self.saver
            .as_ref()
            .ok_or_else(|| GraphError::Configuration("graph was compiled without a checkpointer".into()))
    }

    async fn run(&self, input: GraphInput, config: &CheckpointConfig) -> Result<RunOutput> {
        let thread_id = config.thread_id.clone();
        if self.saver.is_some() {
            config.require_thread_id()?;
        }

        let latest = match &self.saver {
            Some(saver) => saver.get_tuple(&CheckpointConfig {
                checkpoint_id: None,
                ..config.clone()
            })
            .await?,
            None => None,
        };

        let mut events = Vec::new();
        let mut head = latest.as_ref().map(|t| t.config.clone());
        let mut resume = None;
        let mut source = CheckpointSource::Loop;

        let (mut state, mut step, mut current) = match input {
            GraphInput::State(values) => {
                let (mut state, step) = match latest {
                    Some(tuple) => (tuple.checkpoint.values, tuple.metadata.step.unwrap_or(-1) + 1),
                    None => (Value::Object(Map::new()), -1),
                };
                self.schema.apply(&mut state, &values)?;

                head = self
                    .save(
                        config,
                        head,
                        &state,
                        vec![self.entry.clone()],
                        Vec::new(),
                        CheckpointSource::Input,
                        step,
                    )
                    .await?;
                info!(thread_id = ?thread_id, entry = %self.entry, "Starting graph run");
                (state, step + 1, Some(self.entry.clone()))
            }
            GraphInput::Command(command) => {
                self.require_saver()?;
                let thread = thread_id.clone().unwrap_or_default();
                let tuple = latest.ok_or_else(|| GraphError::ThreadNotFound(thread.clone()))?;
                let node = tuple
                    .checkpoint
                    .next
                    .first()
                    .cloned()
                    .ok_or(GraphError::NotInterrupted(thread))?;

                let mut state = tuple.checkpoint.values;
                if let Some(update) = &command.update {
                    self.schema.apply(&mut state, update)?;
                }
                resume = command.resume;
                source = CheckpointSource::Resume;
                info!(thread_id = ?thread_id, node = %node, "Resuming graph run");
                (state, tuple.metadata.step.unwrap_or(-1) + 1, Some(node))
            }
        };

        let mut executed = 0;
        while let Some(node) = current {
            if executed >= self.recursion_limit {
                return Err(GraphError::RecursionLimit(self.recursion_limit));
            }
            executed += 1;

            let executor = self
                .nodes
                .get(&node)
                .cloned()
                .ok_or_else(|| GraphError::Validation(format!("Node '{node}' does not exist")))?;

            let ctx = NodeContext::new(node.clone(), thread_id.clone(), step).with_resume(resume.take());
            debug!(node = %node, step, "Executing node");

            match executor(state.clone(), ctx).await {
                Ok(update) => {
                    self.schema.apply(&mut state, &update)?;
                    events.push(StreamEvent::Update {
                        node: node.clone(),
                        values: update,
                    });

                    current = self.successors.get(&node).cloned();
                    head = self
                        .save(
                            config,
                            head,
                            &state,
                            current.iter().cloned().collect(),
                            Vec::new(),
                            source.clone(),
                            step,
                        )
                        .await?;
                    source = CheckpointSource::Loop;
                    step += 1;
                }
                Err(GraphError::Interrupted { value, .. }) => {
                    let pending = PendingInterrupt::new(node.clone(), value.clone());
                    info!(node = %node, interrupt_id = %pending.id, "Graph interrupted");
                    events.push(StreamEvent::Interrupt {
                        id: pending.id.clone(),
                        node: node.clone(),
                        value,
                    });
                    self.save(config, head, &state, vec![node], vec![pending], source, step)
                        .await?;
                    return Ok(RunOutput { events, values: state });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(RunOutput { events, values: state })
    }

    #[allow(clippy::too_many_arguments)]
    async fn save(
        &self,
        config: &CheckpointConfig,
        head: Option<CheckpointConfig>,
        state: &Value,
        next: Vec<String>,
        interrupts: Vec<PendingInterrupt>,
        source: CheckpointSource,
        step: i32,
    ) -> Result<Option<CheckpointConfig>> {
        let Some(saver) = &self.saver else {
            return Ok(None);
        };

        let parent = head.unwrap_or_else(|| CheckpointConfig {
            checkpoint_id: None,
            ..config.clone()
        });
        let checkpoint = Checkpoint::new(state.clone(), next).with_interrupts(interrupts);
        let metadata = CheckpointMetadata::new().with_source(source).with_step(step);

        Ok(Some(saver.put(&parent, checkpoint, metadata).await?))
    }
}
