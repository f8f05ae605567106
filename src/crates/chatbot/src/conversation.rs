//! One chat turn as a graph run
//!
//! ```text
//! START -> process_message -> END
//!            │ messages += [user, assistant]
//!            └ blog_content = post (blog requests only)
//! ```
//!
//! The graph has no checkpointer; the session owns the history and feeds it
//! in on every turn.

use chat_graph::{
    ChatModel, ChatRequest, CompiledGraph, GraphInput, Message, NodeContext, NodeFuture, StateGraph,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thread_checkpoint::CheckpointConfig;
use tracing::{info, warn};

use crate::blog::BlogWriter;
use crate::error::{ChatbotError, Result};
use crate::session::ChatSession;

/// Name of the turn node
pub const PROCESS_MESSAGE_NODE: &str = "process_message";

/// Reply used when the model call fails
pub fn apology(err: &dyn std::fmt::Display) -> String {
    format!("I apologize, but I encountered an error: {err}")
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Messages the turn appended, user message first
    pub messages: Vec<Message>,
    /// Blog post text when the turn wrote one
    pub blog_content: Option<String>,
}

impl Turn {
    /// The assistant's reply text
    pub fn reply(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| !m.is_human())
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
struct TurnDeps {
    model: Arc<dyn ChatModel>,
    temperature: Option<f32>,
    blog: Option<BlogWriter>,
}

/// Runs chat turns against a model, optionally with blog writing
#[derive(Clone)]
pub struct ConversationEngine {
    graph: CompiledGraph,
    model_name: String,
    blog_mode: bool,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("model", &self.model_name)
            .field("blog_mode", &self.blog_mode)
            .finish()
    }
}

impl ConversationEngine {
    pub fn new(model: Arc<dyn ChatModel>, temperature: Option<f32>, blog: Option<BlogWriter>) -> Result<Self> {
        let model_name = model.model_name().to_string();
        let blog_mode = blog.is_some();
        let deps = TurnDeps {
            model,
            temperature,
            blog,
        };

        let mut graph = StateGraph::new();
        graph
            .add_node(PROCESS_MESSAGE_NODE, move |state: Value, _ctx: NodeContext| -> NodeFuture {
                Box::pin(process_message(state, deps.clone()))
            })
            .set_entry_point(PROCESS_MESSAGE_NODE)
            .set_finish_point(PROCESS_MESSAGE_NODE)
            .append_key("messages");

        Ok(Self {
            graph: graph.compile()?,
            model_name,
            blog_mode,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn blog_mode(&self) -> bool {
        self.blog_mode
    }

    /// Run one turn over the session's history
    ///
    /// The session itself is not modified; push [`Turn::messages`] to keep it.
    pub async fn turn(&self, session: &ChatSession, input: &str) -> Result<Turn> {
        let input = json!({
            "messages": serde_json::to_value(session.messages())?,
            "user_input": input,
        });
        let config = CheckpointConfig::for_thread(session.conversation_id.clone());

        let state = self.graph.invoke(GraphInput::State(input), &config).await?;

        let mut messages: Vec<Message> =
            serde_json::from_value(state.get("messages").cloned().unwrap_or(Value::Array(Vec::new())))?;
        if messages.len() < session.len() {
            return Err(ChatbotError::Graph(chat_graph::GraphError::State(
                "conversation history shrank during a turn".into(),
            )));
        }

        Ok(Turn {
            messages: messages.split_off(session.len()),
            blog_content: state
                .get("blog_content")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

async fn process_message(state: Value, deps: TurnDeps) -> chat_graph::Result<Value> {
    let input = state
        .get("user_input")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let user = Message::human(input.clone());

    let mut blog_content = None;
    let reply = match blog_reply(&deps, &input).await {
        Some(Ok(post)) => {
            blog_content = Some(post.clone());
            post
        }
        Some(Err(err)) => {
            warn!(error = %err, "Blog writing failed");
            apology(&err)
        }
        None => {
            let mut history: Vec<Message> =
                serde_json::from_value(state.get("messages").cloned().unwrap_or(Value::Array(Vec::new())))?;
            history.push(user.clone());

            let mut request = ChatRequest::new(history);
            if let Some(temperature) = deps.temperature {
                request = request.with_temperature(temperature);
            }
            match deps.model.chat(request).await {
                Ok(response) => response.message.content,
                Err(err) => {
                    warn!(error = %err, "Chat model call failed");
                    apology(&err)
                }
            }
        }
    };

    Ok(json!({
        "messages": serde_json::to_value(vec![user, Message::assistant(reply)])?,
        "user_input": "",
        "blog_content": blog_content,
    }))
}

/// `None` when blog mode is off or the input is not a blog request
async fn blog_reply(deps: &TurnDeps, input: &str) -> Option<chat_graph::Result<String>> {
    let writer = deps.blog.as_ref()?;
    match writer.is_blog_request(input).await {
        Ok(true) => {
            info!("Researching and writing blog post");
            Some(writer.write_blog(input).await.map(|post| post.content))
        }
        Ok(false) => None,
        Err(err) => Some(Err(err)),
    }
}
