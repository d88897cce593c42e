use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format '{0}' (expected yaml, yml, json or toml)")]
    UnsupportedFormat(String),

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: String, value: String },

    #[error("unknown backend '{0}'")]
    UnknownBackend(String),

    #[error("unknown toolkit '{name}' (available: {available})")]
    UnknownToolkit { name: String, available: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}
