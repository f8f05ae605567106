//! Commands used to resume an interrupted thread

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resume instruction for a thread paused at an interrupt
///
/// ```rust,ignore
/// graph.stream(GraphInput::Command(Command::resume(json!("yes"))), &config).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Value returned by the pending `interrupt()` call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<Value>,

    /// State update merged before the interrupted node re-runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,
}

impl Command {
    /// Create a new empty command
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command that resumes with the given value
    pub fn resume(value: impl Into<Value>) -> Self {
        Self::new().with_resume(value)
    }

    /// Set the resume value
    pub fn with_resume(mut self, value: impl Into<Value>) -> Self {
        self.resume = Some(value.into());
        self
    }

    /// Set the state update
    pub fn with_update(mut self, update: Value) -> Self {
        self.update = Some(update);
        self
    }
}
