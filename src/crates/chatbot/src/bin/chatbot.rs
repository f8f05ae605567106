//! chatbot CLI
//!
//! Interactive console chatbot with saved conversations, an optional blog
//! writing mode and a scripted demo.

use anyhow::Context;
use chat_graph::ChatModel;
use chatbot::{
    run_demo, BlogWriter, ChatApp, ChatbotConfig, ConversationEngine, ConversationStore,
    DuckDuckGoSearch, DEFAULT_SYSTEM_PROMPT,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Chat from the console
    Interactive,
    /// Run a scripted conversation
    Demo,
}

#[derive(Parser)]
#[command(name = "chatbot")]
#[command(about = "Console chatbot with saved conversations and blog writing", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Run mode
    #[arg(short, long, value_enum, default_value = "interactive")]
    mode: Mode,

    /// Detect blog requests and research/write blog posts
    #[arg(long)]
    blog: bool,

    /// Chat model name
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Directory for saved conversations
    #[arg(long)]
    conversations_dir: Option<PathBuf>,

    /// Config file (default: ./chatbot.toml, then ~/.chatbot/chatbot.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the web search during blog research
    #[arg(long)]
    no_search: bool,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Console output is the UI; keep logs quiet unless asked for
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(rust_log)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ChatbotConfig::load(cli.config.as_deref()).context("failed to load chatbot configuration")?;
    if let Some(model) = cli.model {
        config.model.model = model;
    }
    if let Some(temperature) = cli.temperature {
        config.model.temperature = temperature;
    }
    if let Some(dir) = cli.conversations_dir {
        config.storage.conversations_dir = dir;
    }
    if cli.api_key.is_some() {
        config.model.api_key = cli.api_key;
    }
    if cli.base_url.is_some() {
        config.model.base_url = cli.base_url;
    }
    if cli.no_search {
        config.blog.search = false;
    }
    config.validate()?;

    let client = llm::OpenAiClient::new(config.llm_config()?).context("failed to build chat model client")?;
    let model: Arc<dyn ChatModel> = Arc::new(client);
    tracing::info!("Using model {}", model.model_name());

    let blog = if cli.blog {
        let mut writer = BlogWriter::new(model.clone())
            .with_word_count(config.blog.word_count)
            .with_temperature(config.model.temperature);
        if config.blog.search {
            writer = writer.with_search(Arc::new(DuckDuckGoSearch::new()?));
        }
        Some(writer)
    } else {
        None
    };

    let engine = ConversationEngine::new(model, Some(config.model.temperature), blog)?;
    let store = ConversationStore::open(&config.storage.conversations_dir).with_context(|| {
        format!(
            "failed to open conversations directory {}",
            config.storage.conversations_dir.display()
        )
    })?;

    let mut stdout = std::io::stdout();
    match cli.mode {
        Mode::Demo => {
            run_demo(engine, store, &mut stdout).await?;
        }
        Mode::Interactive => {
            let mut app = if cli.blog {
                ChatApp::blog(engine, store)
            } else {
                ChatApp::new(engine, store, DEFAULT_SYSTEM_PROMPT)
            };
            app.run(std::io::stdin().lock(), &mut stdout).await?;
        }
    }

    Ok(())
}
