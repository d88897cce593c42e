use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod factory;
pub use factory::ClientFactory;

/// Backend type for LLM models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    OpenAI,
    Groq,
    DeepSeek,
    Qwen,
    OpenRouter,
    Ollama,
    Anthropic,
    /// Any other OpenAI-compatible server; needs an explicit URL
    Llama,
}

impl BackendType {
    /// Parse backend type from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Some(Self::OpenAI),
            "groq" => Some(Self::Groq),
            "deepseek" => Some(Self::DeepSeek),
            "qwen" | "dashscope" => Some(Self::Qwen),
            "openrouter" => Some(Self::OpenRouter),
            "ollama" => Some(Self::Ollama),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "llama" | "llamacpp" | "llama.cpp" | "llama-cpp" | "custom" | "vllm" => {
                Some(Self::Llama)
            }
            _ => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Groq => "groq",
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
            Self::Llama => "llama",
        }
    }

    /// Environment variable consulted when no API key is given explicitly
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Self::Qwen => Some("QWEN_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama | Self::Llama => None,
        }
    }

    /// Whether requests without a key are expected to fail
    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }

    /// Provider label used in error messages
    pub fn provider_label(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Groq => "Groq",
            Self::DeepSeek => "DeepSeek",
            Self::Qwen => "Qwen",
            Self::OpenRouter => "OpenRouter",
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
            Self::Llama => "OpenAI-compatible",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default OpenAI API URL
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default Groq API URL
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default DeepSeek API URL
pub const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Default Qwen (DashScope compatible mode) API URL
pub const QWEN_API_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";

/// Default OpenRouter API URL
pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default local Ollama API URL
pub const OLLAMA_API_URL: &str = "http://localhost:11434/v1/chat/completions";

/// Default Anthropic API URL
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

/// Get the default URL for a given backend type
pub fn default_url_for_backend(backend: &BackendType) -> Option<String> {
    let url = match backend {
        BackendType::OpenAI => OPENAI_API_URL,
        BackendType::Groq => GROQ_API_URL,
        BackendType::DeepSeek => DEEPSEEK_API_URL,
        BackendType::Qwen => QWEN_API_URL,
        BackendType::OpenRouter => OPENROUTER_API_URL,
        BackendType::Ollama => OLLAMA_API_URL,
        BackendType::Anthropic => ANTHROPIC_API_URL,
        BackendType::Llama => return None,
    };
    Some(url.to_string())
}

/// Per-model request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Dump every request body under the logs directory
    #[serde(default)]
    pub log_requests: bool,
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            log_requests: false,
        }
    }
}

impl ModelSettings {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parse model configuration string in format "model@backend(api_url)" or "model@backend" or "model"
/// Returns (model_name, backend, api_url)
pub fn parse_model_spec(spec: &str) -> (String, Option<BackendType>, Option<String>) {
    let Some((model, backend_part)) = spec.split_once('@') else {
        return (spec.to_string(), None, None);
    };

    match backend_part.find('(') {
        Some(pos) => {
            let backend = BackendType::from_str(&backend_part[..pos]);
            let inner = &backend_part[pos + 1..];
            let url = inner.strip_suffix(')').unwrap_or(inner);
            let api_url = (!url.is_empty()).then(|| url.to_string());
            (model.to_string(), backend, api_url)
        }
        None => (model.to_string(), BackendType::from_str(backend_part), None),
    }
}

/// Normalize API URL by ensuring it has the correct path for OpenAI-compatible endpoints
pub fn normalize_api_url(url: &str) -> String {
    if url.contains("/completions") || url.contains("/chat") {
        return url.to_string();
    }

    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        return format!("{}/chat/completions", trimmed);
    }

    if url.ends_with('/') {
        format!("{}v1/chat/completions", url)
    } else {
        format!("{}/v1/chat/completions", url)
    }
}
