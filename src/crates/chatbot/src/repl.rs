//! Interactive console loop
//!
//! [`ChatApp`] owns the current session and dispatches each input line:
//! built-in commands act on the session or the store, everything else is a
//! chat turn through the [`ConversationEngine`]. Input and output are generic
//! so the loop can be driven from tests.

use chrono::Local;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::commands::{help_text, InputCommand};
use crate::conversation::{ConversationEngine, Turn};
use crate::error::{ChatbotError, Result};
use crate::session::{conversation_id, ChatSession, BLOG_ID_PREFIX, BLOG_SYSTEM_PROMPT};
use crate::store::ConversationStore;

const RULE_WIDTH: usize = 60;

/// What the loop does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A chat session bound to an engine and a conversation store
#[derive(Debug)]
pub struct ChatApp {
    engine: ConversationEngine,
    store: ConversationStore,
    session: ChatSession,
    system_prompt: String,
    id_prefix: String,
}

impl ChatApp {
    /// Start a fresh `conv_*` session
    pub fn new(engine: ConversationEngine, store: ConversationStore, system_prompt: impl Into<String>) -> Self {
        Self::with_prefix(engine, store, system_prompt, "conv")
    }

    /// Start a fresh blog mode session, IDs look like `crewai_conv_*`
    pub fn blog(engine: ConversationEngine, store: ConversationStore) -> Self {
        Self::with_prefix(engine, store, BLOG_SYSTEM_PROMPT, BLOG_ID_PREFIX)
    }

    /// Start a fresh session whose ID starts with `id_prefix`
    pub fn with_prefix(
        engine: ConversationEngine,
        store: ConversationStore,
        system_prompt: impl Into<String>,
        id_prefix: impl Into<String>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        let id_prefix = id_prefix.into();
        let id = unique_id(&store, &id_prefix, None);
        let session = ChatSession::new(id, &system_prompt, engine.model_name());

        Self {
            engine,
            store,
            session,
            system_prompt,
            id_prefix,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ChatSession {
        &mut self.session
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Run the loop until `quit` or end of input
    pub async fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<()> {
        self.print_welcome(out)?;

        let mut buf = Vec::new();
        loop {
            write!(out, "\nYou: ")?;
            out.flush()?;

            buf.clear();
            let read = match input.read_until(b'\n', &mut buf) {
                Ok(read) => read,
                Err(err) => {
                    warn!(error = %err, "Failed to read input, ending conversation");
                    writeln!(out)?;
                    self.quit(out)?;
                    return Err(err.into());
                }
            };
            if read == 0 {
                writeln!(out)?;
                self.quit(out)?;
                return Ok(());
            }

            // Invalid UTF-8 is replaced rather than ending the session
            let line = String::from_utf8_lossy(&buf);
            match self.handle_line(&line, out).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(err) => {
                    warn!(error = %err, "Conversation ended by an error");
                    if let Err(save_err) = self.save() {
                        warn!(error = %save_err, "Failed to save conversation");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Handle one line of input
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        match InputCommand::parse(line) {
            InputCommand::Empty => {}
            InputCommand::Quit => {
                self.quit(out)?;
                return Ok(Flow::Quit);
            }
            InputCommand::Help => write!(out, "{}", help_text(self.engine.blog_mode()))?,
            InputCommand::History => write!(out, "{}", self.session.format_history())?,
            InputCommand::Save => match self.save() {
                Ok(path) => writeln!(out, "Conversation saved to {}", path.display())?,
                Err(err) => writeln!(out, "Failed to save conversation: {err}")?,
            },
            InputCommand::Clear => {
                self.clear();
                writeln!(out, "Started a new conversation: {}", self.session.conversation_id)?;
            }
            InputCommand::Load(id) if id.is_empty() => {
                writeln!(out, "Usage: load <conversation_id>")?;
            }
            InputCommand::Load(id) => match self.load(&id) {
                Ok(()) => writeln!(
                    out,
                    "Loaded conversation: {} ({} messages)",
                    id,
                    self.session.len()
                )?,
                Err(ChatbotError::ConversationNotFound(_)) => {
                    writeln!(out, "Conversation {id} not found")?;
                }
                Err(err) => writeln!(out, "Error loading conversation: {err}")?,
            },
            InputCommand::Chat(text) => {
                self.send(&text, out).await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Run one chat turn, append it to the session and print the reply
    pub async fn send<W: Write>(&mut self, text: &str, out: &mut W) -> Result<Turn> {
        let turn = self.engine.turn(&self.session, text).await?;
        for message in &turn.messages {
            self.session.push(message.clone());
        }

        match &turn.blog_content {
            Some(post) => {
                self.session.record_blog();
                writeln!(out, "\nBlog Post:")?;
                writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
                writeln!(out, "{post}")?;
                writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
            }
            None => writeln!(out, "\nAssistant: {}", turn.reply())?,
        }

        debug!(
            conversation_id = %self.session.conversation_id,
            messages = self.session.len(),
            "Turn complete"
        );
        Ok(turn)
    }

    pub fn save(&self) -> Result<PathBuf> {
        self.store.save(&self.session)
    }

    /// Replace the current session with a saved one
    pub fn load(&mut self, conversation_id: &str) -> Result<()> {
        self.session = self.store.load(conversation_id)?;
        Ok(())
    }

    /// Switch to a new session holding only the system prompt
    pub fn clear(&mut self) {
        let id = unique_id(&self.store, &self.id_prefix, Some(&self.session.conversation_id));
        self.session = ChatSession::new(id, &self.system_prompt, self.engine.model_name());
    }

    fn quit<W: Write>(&self, out: &mut W) -> Result<()> {
        match self.save() {
            Ok(path) => writeln!(out, "Conversation saved to {}", path.display())?,
            Err(err) => {
                warn!(error = %err, "Failed to save conversation on exit");
                writeln!(out, "Failed to save conversation: {err}")?;
            }
        }
        writeln!(out, "Goodbye!")?;
        Ok(())
    }

    fn print_welcome<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Welcome to the chatbot! (model: {})", self.engine.model_name())?;
        if self.engine.blog_mode() {
            writeln!(out, "Blog mode is on: ask me to write a blog about any topic.")?;
        }
        writeln!(out, "Conversation ID: {}", self.session.conversation_id)?;
        writeln!(out, "Type 'help' for commands, 'quit' to exit.")?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }
}

/// Timestamped ID not yet used by the store or by `current`
fn unique_id(store: &ConversationStore, prefix: &str, current: Option<&str>) -> String {
    let base = conversation_id(prefix, Local::now());
    let taken = |id: &str| store.exists(id) || current == Some(id);

    if !taken(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DEFAULT_SYSTEM_PROMPT;
    use async_trait::async_trait;
    use chat_graph::{ChatModel, ChatRequest, ChatResponse, Message};
    use std::sync::Arc;

    struct CountingModel;

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn chat(&self, request: ChatRequest) -> chat_graph::Result<ChatResponse> {
            Ok(ChatResponse::from_text(format!("reply #{}", request.messages.len() / 2)))
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn app(dir: &std::path::Path) -> ChatApp {
        let engine = ConversationEngine::new(Arc::new(CountingModel), None, None).unwrap();
        let store = ConversationStore::open(dir).unwrap();
        ChatApp::new(engine, store, DEFAULT_SYSTEM_PROMPT)
    }

    #[tokio::test]
    async fn test_chat_turns_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let mut out = Vec::new();

        app.handle_line("hello", &mut out).await.unwrap();
        app.handle_line("how are you", &mut out).await.unwrap();

        let messages = app.session().messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[1], Message::human("hello"));
        assert_eq!(messages[2], Message::assistant("reply #1"));
        assert_eq!(messages[4], Message::assistant("reply #2"));

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Assistant: reply #1"));
    }

    #[tokio::test]
    async fn test_clear_starts_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let mut out = Vec::new();

        app.handle_line("hello", &mut out).await.unwrap();
        let old_id = app.session().conversation_id.clone();
        assert!(old_id.starts_with("conv_"));

        app.handle_line("clear", &mut out).await.unwrap();
        assert_ne!(app.session().conversation_id, old_id);
        assert_eq!(app.session().len(), 1);
        assert_eq!(app.session().messages()[0], Message::system(DEFAULT_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_blog_session_keeps_prefix_on_clear() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ConversationEngine::new(Arc::new(CountingModel), None, None).unwrap();
        let store = ConversationStore::open(dir.path()).unwrap();
        let mut app = ChatApp::blog(engine, store);
        let mut out = Vec::new();

        let old_id = app.session().conversation_id.clone();
        assert!(old_id.starts_with("crewai_conv_"));
        assert_eq!(app.session().messages()[0], Message::system(BLOG_SYSTEM_PROMPT));

        app.handle_line("clear", &mut out).await.unwrap();
        assert_ne!(app.session().conversation_id, old_id);
        assert!(app.session().conversation_id.starts_with("crewai_conv_"));
        assert_eq!(app.session().messages()[0], Message::system(BLOG_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_save_and_load_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let mut out = Vec::new();

        app.handle_line("hello", &mut out).await.unwrap();
        let saved_id = app.session().conversation_id.clone();
        app.handle_line("save", &mut out).await.unwrap();
        assert!(app.store().exists(&saved_id));

        app.handle_line("clear", &mut out).await.unwrap();
        app.handle_line(&format!("load {saved_id}"), &mut out).await.unwrap();
        assert_eq!(app.session().conversation_id, saved_id);
        assert_eq!(app.session().len(), 3);

        app.handle_line("load conv_missing", &mut out).await.unwrap();
        assert_eq!(app.session().conversation_id, saved_id);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains(&format!("Loaded conversation: {saved_id} (3 messages)")));
        assert!(printed.contains("Conversation conv_missing not found"));
    }

    #[tokio::test]
    async fn test_quit_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let mut out = Vec::new();

        assert_eq!(app.handle_line("hi", &mut out).await.unwrap(), Flow::Continue);
        assert_eq!(app.handle_line("BYE", &mut out).await.unwrap(), Flow::Quit);
        assert!(app.store().exists(&app.session().conversation_id));
        assert!(String::from_utf8(out).unwrap().ends_with("Goodbye!\n"));
    }

    /// Yields one line, then fails
    struct FailingReader {
        sent: bool,
    }

    impl std::io::Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "terminal went away"));
            }
            self.sent = true;
            let line = b"hello\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[tokio::test]
    async fn test_read_error_saves_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let mut out = Vec::new();

        let input = std::io::BufReader::new(FailingReader { sent: false });
        let result = app.run(input, &mut out).await;

        assert!(matches!(result, Err(ChatbotError::Io(_))));
        let saved = app.store().load(&app.session().conversation_id).unwrap();
        assert_eq!(saved.len(), 3);
        assert!(String::from_utf8(out).unwrap().ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_unique_id_skips_taken() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::open(dir.path()).unwrap();

        let first = unique_id(&store, "conv", None);
        let second = unique_id(&store, "conv", Some(&first));
        assert_ne!(first, second);
        assert!(second.starts_with("conv_"));
    }
}
