//! # chat-graph
//!
//! A small checkpointed state graph for conversational workflows with inline
//! human-in-the-loop interrupts.
//!
//! - [`StateGraph`] builds a chain of async nodes between [`START`] and [`END`].
//! - [`CompiledGraph::stream`] runs it, writing a checkpoint through a
//!   [`CheckpointSaver`](thread_checkpoint::CheckpointSaver) after every step.
//! - A node calls [`NodeContext::interrupt`] to pause for input; the caller
//!   later resumes with [`Command::resume`].
//! - [`CompiledGraph::get_state`] reports where a thread stands.
//!
//! The crate also defines the [`Message`] type and the [`ChatModel`] trait
//! that provider clients implement.
//!
//! ```rust,ignore
//! use chat_graph::*;
//! use serde_json::json;
//! use std::sync::Arc;
//! use thread_checkpoint::{CheckpointConfig, InMemoryCheckpointSaver};
//!
//! let mut graph = StateGraph::new();
//! graph
//!     .add_node("ask", |_state, mut ctx| {
//!         Box::pin(async move {
//!             let answer = ctx.interrupt(json!("Name?"))?;
//!             Ok(json!({"name": answer}))
//!         })
//!     })
//!     .set_entry_point("ask")
//!     .set_finish_point("ask");
//!
//! let app = graph.compile_with_checkpointer(Arc::new(InMemoryCheckpointSaver::new()))?;
//! let config = CheckpointConfig::for_thread("t1");
//!
//! app.stream(GraphInput::State(json!({})), &config).await?;     // -> Interrupt("Name?")
//! app.stream(Command::resume("Ada").into(), &config).await?;    // -> Update{name: "Ada"}
//! ```

pub mod builder;
pub mod command;
pub mod compiled;
pub mod error;
pub mod interrupt;
pub mod llm;
pub mod messages;
pub mod state;

pub use builder::{NodeFn, NodeFuture, StateGraph, END, START};
pub use command::Command;
pub use compiled::{CompiledGraph, GraphInput, StateSnapshot, StateTask, StreamEvent, DEFAULT_RECURSION_LIMIT};
pub use error::{GraphError, Result};
pub use interrupt::NodeContext;
pub use llm::{ChatModel, ChatRequest, ChatResponse, UsageMetadata};
pub use messages::{Message, MessageRole};
pub use state::GraphState;
