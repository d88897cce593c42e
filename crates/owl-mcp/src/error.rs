use thiserror::Error;

/// Errors raised while loading MCP config or talking to MCP servers
#[derive(Debug, Error)]
pub enum McpError {
    #[error("failed to read MCP config {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid MCP config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid MCP config: {0}")]
    InvalidConfig(String),

    #[error("failed to connect to MCP server '{server}': {message}")]
    Connect { server: String, message: String },

    #[error("timed out after {secs:.1}s connecting to MCP server '{server}'")]
    Timeout { server: String, secs: f64 },

    #[error("MCP manager is not connected")]
    NotConnected,
}
