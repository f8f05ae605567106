//! OpenAI chat completions client.
//!
//! Works against api.openai.com and any server exposing the same
//! `POST {base_url}/chat/completions` endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::{OpenAiClient, RemoteLlmConfig, OPENAI_BASE_URL};
//! use chat_graph::{ChatModel, ChatRequest, Message};
//!
//! let config = RemoteLlmConfig::from_env("OPENAI_API_KEY", OPENAI_BASE_URL, "gpt-3.5-turbo")?;
//! let client = OpenAiClient::new(config)?;
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use chat_graph::{
    ChatModel, ChatRequest, ChatResponse, Message, Result as GraphResult, UsageMetadata,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// OpenAI API client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// The active configuration.
    pub fn config(&self) -> &RemoteLlmConfig {
        &self.config
    }

    fn convert_message(msg: &Message) -> OpenAiMessage {
        OpenAiMessage {
            role: msg.role.as_str().to_string(),
            content: Some(msg.content.clone()),
        }
    }

    fn convert_response(openai_resp: OpenAiResponse) -> Result<ChatResponse> {
        let choice = openai_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        let usage = openai_resp.usage.map(|u| UsageMetadata {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            usage,
            model: openai_resp.model,
        })
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let req_body = OpenAiRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut req = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&req_body);

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        debug!(model = %self.config.model, messages = req_body.messages.len(), "Sending chat completion");
        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Chat completion failed");

            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationError(error_text),
                429 => LlmError::RateLimitExceeded(error_text),
                _ => LlmError::ProviderError(format!("OpenAI API error {}: {}", status, error_text)),
            });
        }

        let openai_resp: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Self::convert_response(openai_resp)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> GraphResult<ChatResponse> {
        Ok(self.send(&request).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_graph::{GraphError, MessageRole};
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(RemoteLlmConfig::new("test-key", base_url, "gpt-3.5-turbo")).unwrap()
    }

    #[test]
    fn test_message_conversion_all_roles() {
        let sys = OpenAiClient::convert_message(&Message::system("You are helpful"));
        assert_eq!(sys.role, "system");
        assert_eq!(sys.content, Some("You are helpful".to_string()));

        let user = OpenAiClient::convert_message(&Message::human("Hello"));
        assert_eq!(user.role, "user");

        let asst = OpenAiClient::convert_message(&Message::assistant("Hi there!"));
        assert_eq!(asst.role, "assistant");
    }

    #[test]
    fn test_response_without_choices_is_invalid() {
        let resp = OpenAiResponse {
            model: None,
            choices: vec![],
            usage: None,
        };
        assert!(matches!(
            OpenAiClient::convert_response(resp),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "Hello"}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "chatcmpl-123",
                    "object": "chat.completion",
                    "created": 1_700_000_000,
                    "model": "gpt-3.5-turbo-0125",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "Hi there!"},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let response = client
            .chat(ChatRequest::new(vec![Message::human("Hello")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.text(), "Hi there!");
        assert_eq!(response.message.role, MessageRole::Assistant);
        assert_eq!(response.model.as_deref(), Some("gpt-3.5-turbo-0125"));
        assert_eq!(response.usage.unwrap().total_tokens, 13);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        let client = client_for(&server.url());

        let _auth = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;
        let err = client.send(&ChatRequest::new(vec![Message::human("a")])).await.unwrap_err();
        assert!(err.is_auth_error());

        server.reset_async().await;
        let _limited = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .create_async()
            .await;
        let err = client.send(&ChatRequest::new(vec![Message::human("a")])).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimitExceeded(_)));

        server.reset_async().await;
        let _broken = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let err = client
            .chat(ChatRequest::new(vec![Message::human("a")]))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::Model(msg) if msg.contains("boom")));
    }
}
