//! Remote provider clients.

pub mod openai;

pub use openai::OpenAiClient;
