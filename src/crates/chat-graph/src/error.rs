//! Error types for graph construction and execution

use serde_json::Value;
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or running a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed
    ///
    /// Raised by [`StateGraph::compile`](crate::StateGraph::compile) when an
    /// edge points at an unknown node, the entry edge is missing, or a node
    /// has more than one outgoing edge.
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A node returned an error
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution {
        /// Name of the node that failed
        node: String,
        /// Error message from node execution
        error: String,
    },

    /// A node paused execution to wait for human input
    ///
    /// This is a normal workflow pause, not a failure. The runtime catches it,
    /// records the payload in a checkpoint and emits
    /// [`StreamEvent::Interrupt`](crate::StreamEvent::Interrupt).
    #[error("Graph execution interrupted at node '{node}'")]
    Interrupted {
        /// Node where execution was interrupted
        node: String,
        /// Payload handed to the caller
        value: Value,
    },

    /// No checkpoint exists for the thread
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// Resume requested on a thread that has nothing left to run
    #[error("Thread '{0}' is not waiting for input")]
    NotInterrupted(String),

    /// State update had the wrong shape
    #[error("State error: {0}")]
    State(String),

    /// Graph ran more steps than allowed
    #[error("Recursion limit of {0} steps reached")]
    RecursionLimit(usize),

    /// Chat model call failed
    #[error("Model error: {0}")]
    Model(String),

    /// Missing or invalid runtime configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Checkpoint persistence error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] thread_checkpoint::CheckpointError),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    /// Create a node execution error
    pub fn node_execution(node: impl Into<String>, error: impl ToString) -> Self {
        Self::NodeExecution {
            node: node.into(),
            error: error.to_string(),
        }
    }

    /// Whether this error is an interrupt rather than a failure
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_execution_display() {
        let err = GraphError::node_execution("llm_call", "API timeout");
        assert_eq!(err.to_string(), "Node 'llm_call' execution failed: API timeout");
        assert!(!err.is_interrupt());
    }

    #[test]
    fn test_interrupted_is_interrupt() {
        let err = GraphError::Interrupted {
            node: "request_input".into(),
            value: Value::String("Please provide your response:".into()),
        };
        assert!(err.is_interrupt());
        assert_eq!(
            err.to_string(),
            "Graph execution interrupted at node 'request_input'"
        );
    }
}
