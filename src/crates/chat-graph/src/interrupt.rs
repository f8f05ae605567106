//! Inline interrupts
//!
//! A node pauses the run by calling [`NodeContext::interrupt`] with a payload
//! for the caller (usually a prompt). The first time, the call returns
//! `Err(GraphError::Interrupted)`; propagating it with `?` ends the node
//! without producing an update and the runtime checkpoints the pause. When
//! the thread is resumed with [`Command::resume`](crate::Command::resume),
//! the node runs again from the top and the same call returns the resume
//! value instead.
//!
//! ```rust,ignore
//! graph.add_node("request_input", |_state, mut ctx| {
//!     Box::pin(async move {
//!         let answer = ctx.interrupt(json!("Please provide your response:"))?;
//!         Ok(json!({"answer": answer}))
//!     })
//! });
//! ```
//!
//! Code before the `interrupt()` call runs twice, so it should not have side
//! effects that must happen only once.

use serde_json::Value;

use crate::error::{GraphError, Result};

/// Per-execution context handed to every node
#[derive(Debug, Clone)]
pub struct NodeContext {
    node: String,
    thread_id: Option<String>,
    step: i32,
    resume: Option<Value>,
}

impl NodeContext {
    pub(crate) fn new(node: impl Into<String>, thread_id: Option<String>, step: i32) -> Self {
        Self {
            node: node.into(),
            thread_id,
            step,
            resume: None,
        }
    }

    pub(crate) fn with_resume(mut self, resume: Option<Value>) -> Self {
        self.resume = resume;
        self
    }

    /// Name of the executing node
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Thread the run belongs to
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Step number of this execution
    pub fn step(&self) -> i32 {
        self.step
    }

    /// Whether a resume value is waiting to be consumed
    pub fn is_resuming(&self) -> bool {
        self.resume.is_some()
    }

    /// Pause for human input, or return the value the thread was resumed with
    pub fn interrupt(&mut self, value: impl Into<Value>) -> Result<Value> {
        match self.resume.take() {
            Some(resume) => Ok(resume),
            None => Err(GraphError::Interrupted {
                node: self.node.clone(),
                value: value.into(),
            }),
        }
    }
}
