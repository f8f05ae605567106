//! Graph builder
//!
//! [`StateGraph`] collects nodes and edges and validates them in
//! [`compile`](StateGraph::compile). Topologies are linear chains (each node
//! has at most one successor); a node without an outgoing edge ends the run.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thread_checkpoint::CheckpointSaver;

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::interrupt::NodeContext;
use crate::state::StateSchema;

/// Virtual entry node
pub const START: &str = "__start__";
/// Virtual exit node
pub const END: &str = "__end__";

/// Future returned by a node
pub type NodeFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Shared node executor
pub type NodeFn = Arc<dyn Fn(Value, NodeContext) -> NodeFuture + Send + Sync>;

/// Builder for a checkpointed state graph
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, NodeFn>,
    order: Vec<String>,
    edges: Vec<(String, String)>,
    schema: StateSchema,
    errors: Vec<String>,
}

impl StateGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node
    ///
    /// The executor receives the current state and a [`NodeContext`] and
    /// returns an update object merged into the state.
    pub fn add_node<F>(&mut self, name: impl Into<String>, executor: F) -> &mut Self
    where
        F: Fn(Value, NodeContext) -> NodeFuture + Send + Sync + 'static,
    {
        let name = name.into();
        if name == START || name == END || name.is_empty() {
            self.errors.push(format!("'{name}' is not a valid node name"));
        } else if self.nodes.insert(name.clone(), Arc::new(executor)).is_some() {
            self.errors.push(format!("Node '{name}' added twice"));
        } else {
            self.order.push(name);
        }
        self
    }

    /// Add a directed edge; use [`START`] and [`END`] for the virtual nodes
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Shorthand for `add_edge(START, node)`
    pub fn set_entry_point(&mut self, node: impl Into<String>) -> &mut Self {
        self.add_edge(START, node)
    }

    /// Shorthand for `add_edge(node, END)`
    pub fn set_finish_point(&mut self, node: impl Into<String>) -> &mut Self {
        self.add_edge(node, END)
    }

    /// Make updates to `key` extend the existing array instead of replacing it
    pub fn append_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.schema.add_append_key(key);
        self
    }

    /// Validate and compile without persistence
    ///
    /// Interrupts still pause the run, but the thread cannot be resumed.
    pub fn compile(self) -> Result<CompiledGraph> {
        self.build(None)
    }

    /// Validate and compile with a checkpoint saver
    pub fn compile_with_checkpointer(self, saver: Arc<dyn CheckpointSaver>) -> Result<CompiledGraph> {
        self.build(Some(saver))
    }

    fn build(self, saver: Option<Arc<dyn CheckpointSaver>>) -> Result<CompiledGraph> {
        if let Some(first) = self.errors.first() {
            return Err(GraphError::Validation(first.clone()));
        }

        let mut successors: HashMap<String, String> = HashMap::new();
        let mut seen_sources = HashSet::new();

        for (from, to) in &self.edges {
            if from == END {
                return Err(GraphError::Validation("END cannot have outgoing edges".into()));
            }
            if to == START {
                return Err(GraphError::Validation("START cannot be an edge target".into()));
            }
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::Validation(format!("Edge source '{from}' does not exist")));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(GraphError::Validation(format!("Edge target '{to}' does not exist")));
            }
            if !seen_sources.insert(from.clone()) {
                return Err(GraphError::Validation(format!(
                    "Node '{from}' has more than one outgoing edge"
                )));
            }
            successors.insert(from.clone(), to.clone());
        }

        let entry = successors
            .remove(START)
            .ok_or_else(|| GraphError::Validation("Graph has no entry point".into()))?;
        if entry == END {
            return Err(GraphError::Validation("Entry point cannot be END".into()));
        }

        let successors = successors
            .into_iter()
            .filter(|(_, to)| to != END)
            .collect();

        Ok(CompiledGraph::new(
            self.nodes,
            self.order,
            entry,
            successors,
            self.schema,
            saver,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(_state: Value, _ctx: NodeContext) -> NodeFuture {
        Box::pin(async { Ok(json!({})) })
    }

    #[test]
    fn test_compile_linear_graph() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop).add_node("b", noop);
        graph.add_edge(START, "a").add_edge("a", "b").set_finish_point("b");
        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.entry(), "a");
        assert_eq!(compiled.node_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_entry() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop);
        assert!(matches!(graph.compile(), Err(GraphError::Validation(_))));
    }

    #[test]
    fn test_unknown_edge_target() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop).set_entry_point("a").add_edge("a", "missing");
        let err = graph.compile().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_two_outgoing_edges_rejected() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop).add_node("b", noop);
        graph.set_entry_point("a").add_edge("a", "b").add_edge("a", END);
        assert!(matches!(graph.compile(), Err(GraphError::Validation(_))));
    }

    #[test]
    fn test_duplicate_and_reserved_names() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop).add_node("a", noop).set_entry_point("a");
        assert!(graph.compile().is_err());

        let mut graph = StateGraph::new();
        graph.add_node(END, noop);
        assert!(graph.compile().is_err());
    }
}
