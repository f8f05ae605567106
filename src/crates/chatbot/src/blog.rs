//! Blog writing
//!
//! A blog request goes through two model calls: a research step, seeded with
//! web search results when a [`SearchTool`] is available, and a writing step
//! that turns the research notes into a short post.

use chat_graph::{ChatModel, ChatRequest, Message, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::search::SearchTool;

const RESEARCHER_PROMPT: &str = "You are an expert research analyst with years of experience in gathering \
and analyzing information from various sources. You identify credible sources and extract key insights.";

const WRITER_PROMPT: &str = "You are a skilled content writer who creates engaging blog posts. \
You make complex topics accessible and write in a clear, concise and engaging style.";

/// Default target length of a post
pub const DEFAULT_WORD_COUNT: usize = 300;

/// Output of a blog run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    /// Research notes the post was written from
    pub research: String,
    /// The post itself
    pub content: String,
}

/// Classifies requests and writes blog posts with a chat model
#[derive(Clone)]
pub struct BlogWriter {
    model: Arc<dyn ChatModel>,
    search: Option<Arc<dyn SearchTool>>,
    word_count: usize,
    temperature: Option<f32>,
}

impl std::fmt::Debug for BlogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogWriter")
            .field("model", &self.model.model_name())
            .field("search", &self.search.as_ref().map(|s| s.name().to_string()))
            .field("word_count", &self.word_count)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl BlogWriter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            search: None,
            word_count: DEFAULT_WORD_COUNT,
            temperature: None,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchTool>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn request(&self, messages: Vec<Message>) -> ChatRequest {
        let request = ChatRequest::new(messages);
        match self.temperature {
            Some(t) => request.with_temperature(t),
            None => request,
        }
    }

    /// Ask the model whether `input` is a request to write a blog post
    pub async fn is_blog_request(&self, input: &str) -> Result<bool> {
        let prompt = format!(
            "Determine if this is a request to write a blog post.\n\
             Only respond with 'true' or 'false'.\n\
             User message: {input}"
        );
        let response = self.model.chat(ChatRequest::new(vec![Message::human(prompt)])).await?;
        let verdict = response.text().trim().trim_matches(|c: char| c == '\'' || c == '"' || c == '.');
        debug!(verdict, "Blog request classification");
        Ok(verdict.eq_ignore_ascii_case("true"))
    }

    /// Research `topic` and write a post about it
    pub async fn write_blog(&self, topic: &str) -> Result<BlogPost> {
        info!(topic, "Writing blog post");
        let research = self.research(topic).await?;
        let content = self.write(topic, &research).await?;
        Ok(BlogPost { research, content })
    }

    async fn research(&self, topic: &str) -> Result<String> {
        let mut task = format!(
            "Research the topic: {topic}\n\n\
             Your research should cover:\n\
             1. Key facts and statistics about the topic\n\
             2. Current trends or developments\n\
             3. Different perspectives or viewpoints\n\
             4. Practical applications or examples\n\n\
             Provide a comprehensive summary of your findings."
        );

        if let Some(search) = &self.search {
            match search.search(topic).await {
                Ok(findings) => {
                    task.push_str(&format!("\n\nResults from {}:\n{findings}", search.name()));
                }
                Err(err) => warn!(error = %err, "Web search failed, researching without it"),
            }
        }

        let messages = vec![Message::system(RESEARCHER_PROMPT), Message::human(task)];
        Ok(self.model.chat(self.request(messages)).await?.message.content)
    }

    async fn write(&self, topic: &str, research: &str) -> Result<String> {
        let task = format!(
            "Write a short, engaging blog post about: {topic}\n\n\
             Requirements:\n\
             - Word count: approximately {} words\n\
             - Engaging introduction that hooks the reader\n\
             - Clear, well-structured content with subheadings\n\
             - Practical insights or actionable takeaways\n\
             - Professional yet conversational tone\n\
             - End with a compelling conclusion\n\n\
             Research notes:\n{research}",
            self.word_count
        );

        let messages = vec![Message::system(WRITER_PROMPT), Message::human(task)];
        Ok(self.model.chat(self.request(messages)).await?.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatbotError;
    use async_trait::async_trait;
    use chat_graph::{ChatResponse, GraphError};
    use std::sync::Mutex;

    /// Replies in order and records every request
    struct ScriptedModel {
        replies: Mutex<Vec<String>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .map(ChatResponse::from_text)
                .ok_or_else(|| GraphError::Model("no scripted reply left".into()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct FixedSearch(Option<&'static str>);

    #[async_trait]
    impl SearchTool for FixedSearch {
        async fn search(&self, _query: &str) -> crate::error::Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| ChatbotError::Search("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_classification() {
        let model = Arc::new(ScriptedModel::new(&["true", " 'False'\n", "TRUE."]));
        let writer = BlogWriter::new(model.clone());

        assert!(writer.is_blog_request("Write a blog about tea").await.unwrap());
        assert!(!writer.is_blog_request("hello").await.unwrap());
        assert!(writer.is_blog_request("Blog about rust").await.unwrap());

        let seen = model.seen.lock().unwrap();
        assert!(seen[0].messages[0].content.contains("User message: Write a blog about tea"));
    }

    #[tokio::test]
    async fn test_research_then_write() {
        let model = Arc::new(ScriptedModel::new(&["notes", "the post"]));
        let writer = BlogWriter::new(model.clone())
            .with_search(Arc::new(FixedSearch(Some("- a finding"))))
            .with_word_count(150)
            .with_temperature(0.5);

        let post = writer.write_blog("tea").await.unwrap();
        assert_eq!(
            post,
            BlogPost {
                research: "notes".into(),
                content: "the post".into()
            }
        );

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].messages[1].content.contains("Results from search_web:\n- a finding"));
        assert!(seen[1].messages[1].content.contains("approximately 150 words"));
        assert!(seen[1].messages[1].content.ends_with("Research notes:\nnotes"));
        assert_eq!(seen[1].temperature, Some(0.5));
    }

    #[tokio::test]
    async fn test_search_failure_is_not_fatal() {
        let model = Arc::new(ScriptedModel::new(&["notes", "the post"]));
        let writer = BlogWriter::new(model.clone()).with_search(Arc::new(FixedSearch(None)));

        let post = writer.write_blog("tea").await.unwrap();
        assert_eq!(post.content, "the post");
        assert!(!model.seen.lock().unwrap()[0].messages[1].content.contains("Results from"));
    }
}
