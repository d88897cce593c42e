//! # owl-llm-api
//!
//! A unified interface for the LLM providers owl agents talk to:
//! - OpenAI and every OpenAI-compatible endpoint (Groq, DeepSeek, Qwen,
//!   OpenRouter, Ollama, self-hosted servers)
//! - Anthropic (Claude)
//!
//! ## Example
//!
//! ```rust,no_run
//! use owl_llm_api::{BackendType, ClientFactory, ModelSettings};
//! use owl_llm_api::client::ChatMessage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::create(
//!         BackendType::OpenAI,
//!         None,
//!         "gpt-4o".to_string(),
//!         None,
//!         ModelSettings::default(),
//!         Some("assistant".to_string()),
//!     )?;
//!
//!     let response = client.chat(vec![ChatMessage::user("Hello!")], vec![]).await?;
//!     println!("Response: {}", response.message.content);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mock;


pub use client::{
    ChatMessage, FunctionCall, LlmClient, LlmResponse, TokenUsage, ToolCall, ToolDefinition,
};

pub use config::{
    default_url_for_backend, normalize_api_url, parse_model_spec, BackendType, ClientFactory,
    ModelSettings, ANTHROPIC_API_URL, DEEPSEEK_API_URL, GROQ_API_URL, OLLAMA_API_URL,
    OPENAI_API_URL, OPENROUTER_API_URL, QWEN_API_URL,
};

pub use error::LlmError;
