//! Chat model providers.
//!
//! Implements the [`ChatModel`](chat_graph::ChatModel) trait from `chat-graph`
//! for OpenAI-compatible chat completion APIs.
//!
//! ```rust,ignore
//! use llm::{OpenAiClient, RemoteLlmConfig, OPENAI_BASE_URL};
//! use chat_graph::{ChatModel, ChatRequest, Message};
//!
//! let client = OpenAiClient::new(RemoteLlmConfig::from_env("OPENAI_API_KEY", OPENAI_BASE_URL, "gpt-3.5-turbo")?)?;
//! let response = client
//!     .chat(ChatRequest::new(vec![Message::human("Explain ownership briefly")]).with_temperature(0.7))
//!     .await?;
//! println!("{}", response.text());
//! ```

pub mod config;
pub mod error;
pub mod remote;

pub use config::{RemoteLlmConfig, DEFAULT_MODEL, OPENAI_BASE_URL};
pub use error::{LlmError, Result};
pub use remote::OpenAiClient;

// Re-export the trait surface so callers need only this crate
pub use chat_graph::{ChatModel, ChatRequest, ChatResponse, UsageMetadata};
