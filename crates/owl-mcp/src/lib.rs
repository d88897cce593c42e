//! MCP client integration: connects to the servers listed in an MCP config
//! file and exposes their tools as owl [`Tool`](owl_toolcore::Tool)s.

pub mod config;
pub mod error;
pub mod manager;
pub mod tool;

pub use config::{McpConfig, ServerSpec, ServerTransport, StdioServerConfig, WebServerConfig};
pub use error::McpError;
pub use manager::McpToolkitManager;
pub use tool::McpTool;
