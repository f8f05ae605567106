//! Chat model abstraction
//!
//! Nodes and the CLI talk to language models through [`ChatModel`]. Provider
//! clients (see the `llm` crate) implement it; tests implement it with canned
//! replies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::messages::Message;

/// A request to a chat model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    /// The conversation messages to send to the model
    pub messages: Vec<Message>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with the given messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Set the temperature for generation
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Prompt tokens
    pub input_tokens: u32,
    /// Completion tokens
    pub output_tokens: u32,
    /// Sum of both
    pub total_tokens: u32,
}

/// A chat model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// The assistant message
    pub message: Message,
    /// Token usage, when reported
    pub usage: Option<UsageMetadata>,
    /// Model that produced the reply, when reported
    pub model: Option<String>,
}

impl ChatResponse {
    /// Wrap plain text as an assistant reply
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(text),
            usage: None,
            model: None,
        }
    }

    /// Reply text
    pub fn text(&self) -> &str {
        &self.message.content
    }
}

/// Core trait for chat models
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a conversation and wait for the complete reply
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Check if the model is reachable
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    /// Model identifier used in session metadata
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ChatResponse::from_text(format!("echo: {last}")))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let model: Arc<dyn ChatModel> = Arc::new(EchoModel);
        let request = ChatRequest::new(vec![Message::human("Hello")]).with_temperature(0.2);
        assert_eq!(request.temperature, Some(0.2));

        let response = model.chat(request).await.unwrap();
        assert_eq!(response.text(), "echo: Hello");
        assert!(model.is_available().await.unwrap());
        assert_eq!(model.model_name(), "echo");
    }
}
