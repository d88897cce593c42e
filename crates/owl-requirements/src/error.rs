use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequirementsError {
    #[error("LLM call failed: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("no valid JSON found in response")]
    NoJson,

    #[error("invalid {stage} result: {message}")]
    InvalidResult { stage: &'static str, message: String },

    #[error("{stage} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        stage: &'static str,
        attempts: u32,
        last_error: String,
    },

    #[error("missing input: {0}")]
    MissingInput(&'static str),

    #[error("template '{name}': {message}")]
    Template { name: String, message: String },

    #[error("unknown session '{0}'")]
    SessionNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RequirementsError>;
