use std::sync::Arc;

use anyhow::{Context, Result};
use owl_llm_api::{parse_model_spec, ClientFactory, LlmClient, ModelSettings};
use owl_requirements::QualityChecker;

use crate::config::OwlConfig;

/// Request settings every client built from `config` shares
pub fn model_settings(config: &OwlConfig) -> ModelSettings {
    ModelSettings {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        timeout_secs: config.timeout_secs,
        log_requests: config.log_requests,
    }
}

/// Build a client for `spec` (`model[@backend[(url)]]`).
///
/// The configured backend, URL and key fill in whatever the spec leaves out.
/// The configured key is only used when the spec resolves to the configured
/// backend; otherwise the backend's own environment variable applies.
pub fn create_client(
    config: &OwlConfig,
    spec: &str,
    agent_name: &str,
    settings: ModelSettings,
) -> Result<Arc<dyn LlmClient>> {
    let default_backend = config.backend_type()?;
    let (model, backend, url) = parse_model_spec(spec);
    let backend = backend.unwrap_or(default_backend);

    let same_backend = backend == default_backend;
    let api_key = config.api_key.clone().filter(|_| same_backend);
    let api_url = url.or_else(|| config.api_url.clone().filter(|_| same_backend));

    ClientFactory::create(backend, api_key, model, api_url, settings, Some(agent_name.to_string()))
        .with_context(|| format!("failed to create {} client for '{}'", agent_name, spec))
}

/// User and assistant clients for a role-playing run
pub fn society_clients(config: &OwlConfig) -> Result<(Arc<dyn LlmClient>, Arc<dyn LlmClient>)> {
    let settings = model_settings(config);
    let user_spec = config.user_model.as_deref().unwrap_or(&config.model);
    let user = create_client(config, user_spec, "user", settings.clone())?;
    let assistant = create_client(config, &config.model, "assistant", settings)?;
    Ok((user, assistant))
}

/// Pipeline client plus the low-temperature quality-check client
pub fn requirements_clients(config: &OwlConfig) -> Result<(Arc<dyn LlmClient>, Arc<dyn LlmClient>)> {
    let client = create_client(config, &config.model, "requirements", model_settings(config))?;

    let quality_defaults = QualityChecker::model_settings();
    let quality_settings = ModelSettings {
        temperature: quality_defaults.temperature,
        max_tokens: quality_defaults.max_tokens,
        ..model_settings(config)
    };
    let quality_spec = config.requirements.quality_model.as_deref().unwrap_or(&config.model);
    let quality = create_client(config, quality_spec, "quality_checker", quality_settings)?;
    Ok((client, quality))
}
