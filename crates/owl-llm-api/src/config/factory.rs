use std::env;
use std::sync::Arc;

use crate::client::{anthropic::AnthropicClient, openai::OpenAiCompatibleClient, LlmClient};
use crate::config::{default_url_for_backend, normalize_api_url, parse_model_spec, BackendType, ModelSettings};
use crate::error::LlmError;

/// Client factory for creating LLM clients
pub struct ClientFactory;

impl ClientFactory {
    /// Create an LLM client based on the specified backend type
    ///
    /// # Arguments
    /// * `backend` - The backend type to use
    /// * `api_key` - API key; falls back to the backend's environment variable
    /// * `model` - Model name to use
    /// * `api_url` - Optional custom API URL (uses the backend default if None)
    /// * `settings` - Temperature, token limit and timeout
    /// * `agent_name` - Optional agent name for logging purposes (defaults to "default")
    pub fn create(
        backend: BackendType,
        api_key: Option<String>,
        model: String,
        api_url: Option<String>,
        settings: ModelSettings,
        agent_name: Option<String>,
    ) -> Result<Arc<dyn LlmClient>, LlmError> {
        let agent_name = agent_name.unwrap_or_else(|| "default".to_string());

        let key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| backend.api_key_env().and_then(|var| env::var(var).ok()))
            .or_else(|| {
                (backend == BackendType::Anthropic)
                    .then(|| env::var("ANTHROPIC_AUTH_TOKEN").ok())
                    .flatten()
            })
            .unwrap_or_default();

        if key.is_empty() && backend.requires_api_key() {
            return Err(LlmError::MissingApiKey(backend.as_str().to_string()));
        }

        let url = match api_url.or_else(|| default_url_for_backend(&backend)) {
            Some(url) => url,
            None => return Err(LlmError::MissingApiUrl(backend.as_str().to_string())),
        };

        log::debug!("creating {} client for model '{}' (agent {})", backend, model, agent_name);

        match backend {
            BackendType::Anthropic => Ok(Arc::new(AnthropicClient::new(
                key, model, url, agent_name, settings,
            ))),
            other => Ok(Arc::new(OpenAiCompatibleClient::new(
                other.provider_label(),
                key,
                model,
                normalize_api_url(&url),
                agent_name,
                settings,
            ))),
        }
    }

    /// Create a client from a "model@backend(url)" string, using `default_backend`
    /// when the string names none
    pub fn create_from_spec(
        spec: &str,
        default_backend: BackendType,
        api_key: Option<String>,
        settings: ModelSettings,
        agent_name: Option<String>,
    ) -> Result<Arc<dyn LlmClient>, LlmError> {
        let (model, backend, api_url) = parse_model_spec(spec);
        let backend = backend.unwrap_or(default_backend);
        Self::create(backend, api_key, model, api_url, settings, agent_name)
    }
}
