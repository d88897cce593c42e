use thiserror::Error;

/// Errors surfaced by LLM provider clients
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned no choices")]
    EmptyResponse(&'static str),

    #[error("missing API key for backend '{0}'")]
    MissingApiKey(String),

    #[error("backend '{0}' requires an explicit API URL")]
    MissingApiUrl(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),
}
