//! Drives the console loop end to end with a scripted model

use async_trait::async_trait;
use chat_graph::{ChatModel, ChatRequest, ChatResponse, MessageRole};
use chatbot::{
    BlogWriter, ChatApp, ConversationEngine, ConversationStore, DuckDuckGoSearch, BLOG_SYSTEM_PROMPT,
    DEFAULT_SYSTEM_PROMPT,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Classifies "write a blog" requests as blogs and records every prompt
#[derive(Default)]
struct FakeModel {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn chat(&self, request: ChatRequest) -> chat_graph::Result<ChatResponse> {
        let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.prompts.lock().unwrap().push(last.clone());

        let reply = if last.starts_with("Determine if this is a request to write a blog post.") {
            last.to_lowercase().contains("user message: write a blog").to_string()
        } else if last.starts_with("Research the topic") {
            "Tea is widely consumed.".to_string()
        } else if last.starts_with("Write a short, engaging blog post") {
            "## Why Tea Matters\nA short post.".to_string()
        } else {
            format!("You said: {last}")
        };
        Ok(ChatResponse::from_text(reply))
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[tokio::test]
async fn interactive_session_is_saved_on_eof() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ConversationEngine::new(Arc::new(FakeModel::default()), Some(0.7), None).unwrap();
    let store = ConversationStore::open(dir.path().join("conversations")).unwrap();
    let mut app = ChatApp::new(engine, store.clone(), DEFAULT_SYSTEM_PROMPT);

    let input = Cursor::new("hello\n\nhistory\nwhat is rust?\n");
    let mut out = Vec::new();
    app.run(input, &mut out).await.unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with("Welcome to the chatbot! (model: fake-model)"));
    assert!(printed.contains("Assistant: You said: hello"));
    assert!(printed.contains("2. You: hello"));
    assert!(printed.contains("Assistant: You said: what is rust?"));
    assert!(printed.trim_end().ends_with("Goodbye!"));

    let id = app.session().conversation_id.clone();
    let saved = store.load(&id).unwrap();
    assert_eq!(saved.len(), 5);
    assert_eq!(saved.metadata.model, "fake-model");
    assert_eq!(saved.metadata.message_count, 5);
    assert_eq!(store.list().unwrap(), vec![id]);
}

#[tokio::test]
async fn blog_mode_writes_post_with_search_results() {
    let mut server = mockito::Server::new_async().await;
    let search_mock = server
        .mock("GET", "/")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"Heading":"Tea","AbstractText":"Tea is a drink.","RelatedTopics":[]}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(FakeModel::default());
    let writer = BlogWriter::new(model.clone())
        .with_search(Arc::new(DuckDuckGoSearch::with_base_url(server.url()).unwrap()));
    let engine = ConversationEngine::new(model.clone(), None, Some(writer)).unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let mut app = ChatApp::blog(engine, store.clone());
    assert!(app.session().conversation_id.starts_with("crewai_conv_"));
    assert_eq!(app.session().messages()[0].content, BLOG_SYSTEM_PROMPT);

    let input = Cursor::new("Write a blog about tea\nthanks\nquit\nignored after quit\n");
    let mut out = Vec::new();
    app.run(input, &mut out).await.unwrap();

    search_mock.assert_async().await;

    let printed = String::from_utf8(out).unwrap();
    let rule = "=".repeat(60);
    assert!(printed.contains(&format!("Blog Post:\n{rule}\n## Why Tea Matters\nA short post.\n{rule}")));
    assert!(printed.contains("Assistant: You said: thanks"));
    assert!(!printed.contains("ignored after quit"));

    let session = app.session();
    assert_eq!(session.metadata.blogs_written, 1);
    assert_eq!(session.len(), 5);
    assert_eq!(session.messages()[2].role, MessageRole::Assistant);
    assert_eq!(session.messages()[2].content, "## Why Tea Matters\nA short post.");

    let prompts = model.prompts.lock().unwrap();
    let research = prompts.iter().find(|p| p.starts_with("Research the topic")).unwrap();
    assert!(research.contains("Tea: Tea is a drink."));

    let saved = store.load(&session.conversation_id).unwrap();
    assert_eq!(saved.metadata.blogs_written, 1);
}

#[tokio::test]
async fn invalid_utf8_line_does_not_end_session() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ConversationEngine::new(Arc::new(FakeModel::default()), None, None).unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let mut app = ChatApp::new(engine, store.clone(), DEFAULT_SYSTEM_PROMPT);

    let input = Cursor::new(b"hello\n\xff\xfe caf\nstill here\n".to_vec());
    let mut out = Vec::new();
    app.run(input, &mut out).await.unwrap();

    let session = app.session();
    assert_eq!(session.len(), 7);
    assert_eq!(session.messages()[3].content, "\u{FFFD}\u{FFFD} caf");
    assert_eq!(session.messages()[6].content, "You said: still here");

    let saved = store.load(&session.conversation_id).unwrap();
    assert_eq!(saved.len(), 7);
    assert_eq!(store.list().unwrap(), vec![session.conversation_id.clone()]);
}
