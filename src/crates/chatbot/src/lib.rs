//! # chatbot
//!
//! Console chatbot over a `chat-graph` turn graph. Conversations are kept
//! in memory as append-only [`ChatSession`]s and saved as JSON files; blog
//! mode routes blog requests through a research and writing step.
//!
//! ```rust,ignore
//! let engine = ConversationEngine::new(model, Some(0.7), None)?;
//! let store = ConversationStore::open("conversations")?;
//! let mut app = ChatApp::new(engine, store, DEFAULT_SYSTEM_PROMPT);
//! app.run(std::io::stdin().lock(), &mut std::io::stdout()).await?;
//! ```

pub mod blog;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod demo;
pub mod error;
pub mod repl;
pub mod search;
pub mod session;
pub mod store;

pub use blog::{BlogPost, BlogWriter};
pub use commands::InputCommand;
pub use config::ChatbotConfig;
pub use conversation::{ConversationEngine, Turn};
pub use demo::run_demo;
pub use error::{ChatbotError, Result};
pub use repl::{ChatApp, Flow};
pub use search::{DuckDuckGoSearch, SearchTool};
pub use session::{ChatSession, SessionMetadata, BLOG_ID_PREFIX, BLOG_SYSTEM_PROMPT, DEFAULT_SYSTEM_PROMPT};
pub use store::ConversationStore;
