use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::McpError;

/// Local server launched as a child process speaking MCP over stdio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StdioServerConfig {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Seconds
    #[serde(default)]
    pub timeout: Option<f64>,
}

/// Remote server reached over streamable HTTP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebServerConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Seconds
    #[serde(default)]
    pub timeout: Option<f64>,
}

/// Contents of an MCP config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, StdioServerConfig>,
    #[serde(rename = "mcpWebServers", default)]
    pub mcp_web_servers: BTreeMap<String, WebServerConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerTransport {
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    Http {
        url: String,
    },
}

/// One validated server entry
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSpec {
    pub name: String,
    pub transport: ServerTransport,
    pub timeout: Option<Duration>,
}

fn timeout_from_secs(name: &str, secs: Option<f64>) -> Result<Option<Duration>, McpError> {
    match secs {
        None => Ok(None),
        Some(s) if s.is_finite() && s > 0.0 => Ok(Some(Duration::from_secs_f64(s))),
        Some(s) => Err(McpError::InvalidConfig(format!(
            "server '{}' has invalid timeout {}",
            name, s
        ))),
    }
}

impl McpConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, McpError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| McpError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, McpError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validated server list: stdio servers first, then web servers, each by name
    pub fn servers(&self) -> Result<Vec<ServerSpec>, McpError> {
        let mut specs = Vec::with_capacity(self.mcp_servers.len() + self.mcp_web_servers.len());

        for (name, cfg) in &self.mcp_servers {
            let command = cfg
                .command
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    McpError::InvalidConfig(format!("server '{}' is missing required 'command'", name))
                })?;
            specs.push(ServerSpec {
                name: name.clone(),
                transport: ServerTransport::Stdio {
                    command: command.to_string(),
                    args: cfg.args.clone(),
                    env: cfg.env.clone(),
                },
                timeout: timeout_from_secs(name, cfg.timeout)?,
            });
        }

        for (name, cfg) in &self.mcp_web_servers {
            let url = cfg
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    McpError::InvalidConfig(format!("web server '{}' is missing required 'url'", name))
                })?;
            specs.push(ServerSpec {
                name: name.clone(),
                transport: ServerTransport::Http { url: url.to_string() },
                timeout: timeout_from_secs(name, cfg.timeout)?,
            });
        }

        Ok(specs)
    }
}
