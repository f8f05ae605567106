//! Error types for the chatbot

use thiserror::Error;

/// Result type alias for chatbot operations
pub type Result<T> = std::result::Result<T, ChatbotError>;

/// Chatbot errors
#[derive(Error, Debug)]
pub enum ChatbotError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Saved conversation does not exist
    #[error("Conversation {0} not found")]
    ConversationNotFound(String),

    /// Conversation ID unusable as a file name
    #[error("Invalid conversation ID: {0}")]
    InvalidConversationId(String),

    /// Chat model or conversation graph failure
    #[error(transparent)]
    Graph(#[from] chat_graph::GraphError),

    /// Provider client setup failure
    #[error(transparent)]
    Llm(#[from] llm::LlmError),

    /// Web search failure
    #[error("Search error: {0}")]
    Search(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ChatbotError {
    fn from(err: reqwest::Error) -> Self {
        ChatbotError::Search(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatbotError::ConversationNotFound("conv_20240101_120000".into());
        assert_eq!(err.to_string(), "Conversation conv_20240101_120000 not found");

        let err = ChatbotError::from(chat_graph::GraphError::Model("rate limited".into()));
        assert_eq!(err.to_string(), "Model error: rate limited");
    }
}
