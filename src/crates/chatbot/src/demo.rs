//! Scripted demo conversation

use std::io::Write;

use crate::conversation::ConversationEngine;
use crate::error::Result;
use crate::repl::ChatApp;
use crate::session::ChatSession;
use crate::store::ConversationStore;

/// System prompt for demo sessions
pub const DEMO_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Be conversational and engaging. Keep responses concise.";

/// Messages sent by the demo, in order
pub const DEMO_MESSAGES: [&str; 4] = [
    "Hello! Can you tell me about LangGraph?",
    "That's interesting! How does it compare to regular chatbots?",
    "Can you give me a simple example of how to use it?",
    "Thanks! That was very helpful.",
];

/// Send [`DEMO_MESSAGES`] through a fresh `demo_*` session and save it
pub async fn run_demo<W: Write>(
    engine: ConversationEngine,
    store: ConversationStore,
    out: &mut W,
) -> Result<ChatSession> {
    let mut app = ChatApp::with_prefix(engine, store, DEMO_SYSTEM_PROMPT, "demo");
    app.session_mut().metadata.demo_mode = true;

    writeln!(out, "Starting chatbot demo")?;
    writeln!(out, "{}", "=".repeat(50))?;

    for (i, message) in DEMO_MESSAGES.iter().enumerate() {
        writeln!(out, "\n--- Demo Message {} ---", i + 1)?;
        writeln!(out, "User: {message}")?;
        app.send(message, out).await?;
    }

    let path = app.save()?;
    let session = app.session().clone();

    writeln!(out, "\n{}", "=".repeat(50))?;
    writeln!(out, "Demo completed!")?;
    writeln!(out, "Conversation ID: {}", session.conversation_id)?;
    writeln!(out, "Total messages: {}", session.len())?;
    writeln!(out, "Saved to: {}", path.display())?;

    tracing::info!(conversation_id = %session.conversation_id, "Demo finished");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_graph::{ChatModel, ChatRequest, ChatResponse, MessageRole};
    use std::sync::Arc;

    struct ShortModel;

    #[async_trait]
    impl ChatModel for ShortModel {
        async fn chat(&self, _request: ChatRequest) -> chat_graph::Result<ChatResponse> {
            Ok(ChatResponse::from_text("Sure."))
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_demo_runs_all_messages() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ConversationEngine::new(Arc::new(ShortModel), None, None).unwrap();
        let store = ConversationStore::open(dir.path()).unwrap();
        let mut out = Vec::new();

        let session = run_demo(engine, store.clone(), &mut out).await.unwrap();

        assert_eq!(session.len(), 9);
        assert_eq!(session.messages()[0].content, DEMO_SYSTEM_PROMPT);
        assert_eq!(
            session.messages().iter().filter(|m| m.role == MessageRole::Human).count(),
            4
        );
        assert!(session.metadata.demo_mode);
        assert!(session.conversation_id.starts_with("demo_"));
        assert!(store.load(&session.conversation_id).unwrap().metadata.demo_mode);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("--- Demo Message 4 ---"));
        assert!(printed.contains("Total messages: 9"));
    }
}
