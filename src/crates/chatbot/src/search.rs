//! Web search used by the blog research step

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ChatbotError, Result};

/// Default DuckDuckGo Instant Answer endpoint
pub const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com";

/// A tool that turns a query into plain-text findings
#[async_trait]
pub trait SearchTool: Send + Sync {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for information about a topic"
    }

    async fn search(&self, query: &str) -> Result<String>;
}

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
    #[serde(rename = "FirstURL", default)]
    first_url: Option<String>,
}

/// DuckDuckGo Instant Answer search
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
    max_topics: usize,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DUCKDUCKGO_URL)
    }

    /// Point at another endpoint (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("chatbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_topics: 5,
        })
    }

    fn format_answer(&self, query: &str, answer: InstantAnswer) -> String {
        let mut lines = Vec::new();

        if !answer.abstract_text.is_empty() {
            let heading = if answer.heading.is_empty() { query } else { answer.heading.as_str() };
            lines.push(format!("{heading}: {}", answer.abstract_text));
            if !answer.abstract_url.is_empty() {
                lines.push(format!("Source: {}", answer.abstract_url));
            }
        }

        for topic in answer
            .related_topics
            .into_iter()
            .filter_map(|t| t.text.map(|text| (text, t.first_url)))
            .take(self.max_topics)
        {
            match topic {
                (text, Some(url)) => lines.push(format!("- {text} ({url})")),
                (text, None) => lines.push(format!("- {text}")),
            }
        }

        if lines.is_empty() {
            format!("No results found for '{query}'.")
        } else {
            lines.join("\n")
        }
    }
}

#[async_trait]
impl SearchTool for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<String> {
        tracing::debug!(query, "Searching the web");

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChatbotError::Search(format!(
                "search returned HTTP {}",
                response.status()
            )));
        }

        let answer: InstantAnswer = response.json().await?;
        Ok(self.format_answer(query, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_search_formats_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "rust language".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "Heading": "Rust",
                    "AbstractText": "Rust is a systems programming language.",
                    "AbstractURL": "https://example.org/rust",
                    "RelatedTopics": [
                        {"Text": "Cargo - package manager", "FirstURL": "https://example.org/cargo"},
                        {"Name": "grouped topics without text"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let search = DuckDuckGoSearch::with_base_url(server.url()).unwrap();
        let result = search.search("rust language").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result,
            "Rust: Rust is a systems programming language.\n\
             Source: https://example.org/rust\n\
             - Cargo - package manager (https://example.org/cargo)"
        );
    }

    #[tokio::test]
    async fn test_search_empty_and_error() {
        let mut server = mockito::Server::new_async().await;
        let _empty = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("q".into(), "nothing".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _failing = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("q".into(), "broken".into()))
            .with_status(503)
            .create_async()
            .await;

        let search = DuckDuckGoSearch::with_base_url(server.url()).unwrap();
        assert_eq!(search.search("nothing").await.unwrap(), "No results found for 'nothing'.");
        assert!(matches!(search.search("broken").await, Err(ChatbotError::Search(_))));
        assert_eq!(search.name(), "search_web");
    }
}
