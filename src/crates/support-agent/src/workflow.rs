//! The human-in-the-loop workflow
//!
//! One node, `request_input`, between START and END:
//!
//! ```text
//! START -> request_input -> END
//!            │ interrupt("Please provide your response:")
//!            │ ...resume(user_input)
//!            └ messages += [user, assistant], processing_complete = true
//! ```

use chat_graph::{
    ChatModel, ChatRequest, CompiledGraph, GraphState, Message, NodeContext, NodeFuture, Result,
    StateGraph,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thread_checkpoint::CheckpointSaver;

/// Name of the single workflow node
pub const REQUEST_INPUT_NODE: &str = "request_input";

/// Payload of the interrupt raised by [`REQUEST_INPUT_NODE`]
pub const INTERRUPT_PROMPT: &str = "Please provide your response:";

/// State every new thread starts from
pub fn initial_state() -> Value {
    json!({ "messages": [], "processing_complete": false })
}

/// Fixed reply used when no chat model is configured
pub fn acknowledgement(input: &str) -> String {
    format!("Thank you for your input: '{input}'. Processing complete!")
}

/// Chat model settings for the workflow reply
#[derive(Clone)]
pub struct ReplyModel {
    pub model: Arc<dyn ChatModel>,
    pub temperature: Option<f32>,
}

impl std::fmt::Debug for ReplyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyModel")
            .field("model", &self.model.model_name())
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Build and compile the workflow against `saver`
pub fn build_workflow(saver: Arc<dyn CheckpointSaver>, reply_model: Option<ReplyModel>) -> Result<CompiledGraph> {
    let mut graph = StateGraph::new();
    graph
        .add_node(REQUEST_INPUT_NODE, move |state: Value, ctx: NodeContext| -> NodeFuture {
            Box::pin(request_input(state, ctx, reply_model.clone()))
        })
        .set_entry_point(REQUEST_INPUT_NODE)
        .set_finish_point(REQUEST_INPUT_NODE)
        .append_key("messages");

    graph.compile_with_checkpointer(saver)
}

async fn request_input(state: Value, mut ctx: NodeContext, reply_model: Option<ReplyModel>) -> Result<Value> {
    let input = match ctx.interrupt(INTERRUPT_PROMPT)? {
        Value::String(text) => text,
        other => other.to_string(),
    };
    let user = Message::human(input.clone());

    let reply = match reply_model {
        Some(ReplyModel { model, temperature }) => {
            let mut history = GraphState::from_value(&state)?.messages;
            history.push(user.clone());

            let mut request = ChatRequest::new(history);
            if let Some(temperature) = temperature {
                request = request.with_temperature(temperature);
            }
            tracing::debug!(model = model.model_name(), "Requesting reply from chat model");
            model.chat(request).await?.message.content
        }
        None => acknowledgement(&input),
    };

    Ok(json!({
        "messages": serde_json::to_value(vec![user, Message::assistant(reply)])?,
        "processing_complete": true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_graph::{ChatResponse, Command, GraphError, GraphInput};
    use thread_checkpoint::{CheckpointConfig, InMemoryCheckpointSaver};

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ChatResponse::from_text(format!("echo: {last} ({} messages)", request.messages.len())))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl ChatModel for BrokenModel {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
            Err(GraphError::Model("upstream unavailable".into()))
        }

        fn model_name(&self) -> &str {
            "broken"
        }
    }

    async fn start_and_resume(reply_model: Option<ReplyModel>) -> Result<Value> {
        let app = build_workflow(Arc::new(InMemoryCheckpointSaver::new()), reply_model)?;
        let config = CheckpointConfig::for_thread("t1");

        let events = app.stream(GraphInput::State(initial_state()), &config).await?;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_interrupt(), Some(&json!(INTERRUPT_PROMPT)));

        app.invoke(Command::resume("hello").into(), &config).await
    }

    #[tokio::test]
    async fn test_acknowledgement_reply() {
        let state = start_and_resume(None).await.unwrap();
        let state = GraphState::from_value(&state).unwrap();

        assert!(state.processing_complete);
        assert_eq!(
            state.messages,
            vec![
                Message::human("hello"),
                Message::assistant("Thank you for your input: 'hello'. Processing complete!"),
            ]
        );
    }

    #[tokio::test]
    async fn test_model_reply_sees_history() {
        let reply_model = ReplyModel {
            model: Arc::new(EchoModel),
            temperature: Some(0.3),
        };
        let state = start_and_resume(Some(reply_model)).await.unwrap();
        let state = GraphState::from_value(&state).unwrap();

        assert_eq!(state.messages[1], Message::assistant("echo: hello (1 messages)"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let reply_model = ReplyModel {
            model: Arc::new(BrokenModel),
            temperature: None,
        };
        let err = start_and_resume(Some(reply_model)).await.unwrap_err();
        assert!(matches!(err, GraphError::Model(_)));
    }

    #[test]
    fn test_acknowledgement_format() {
        assert_eq!(acknowledgement("42"), "Thank you for your input: '42'. Processing complete!");
    }
}
