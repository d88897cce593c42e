use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use owl_toolcore::{Tool, ToolRegistry};
use rmcp::transport::streamable_http_client::{
    StreamableHttpClientTransport, StreamableHttpClientTransportConfig,
};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use tokio::process::Command;

use crate::config::{McpConfig, ServerSpec, ServerTransport};
use crate::error::McpError;
use crate::tool::{McpClient, McpTool};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

struct Connection {
    spec: ServerSpec,
    client: Arc<McpClient>,
    tools: Vec<rmcp::model::Tool>,
}

/// Owns the connections to every configured MCP server
pub struct McpToolkitManager {
    servers: Vec<ServerSpec>,
    connections: Vec<Connection>,
    connected: bool,
}

impl std::fmt::Debug for McpToolkitManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolkitManager")
            .field("servers", &self.servers.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("connected", &self.connected)
            .finish()
    }
}

impl McpToolkitManager {
    pub fn new(servers: Vec<ServerSpec>) -> Self {
        Self {
            servers,
            connections: Vec::new(),
            connected: false,
        }
    }

    /// Load and validate every server from a JSON config file
    pub fn from_config(path: impl AsRef<Path>) -> Result<Self, McpError> {
        let config = McpConfig::from_path(path)?;
        Ok(Self::new(config.servers()?))
    }

    pub fn servers(&self) -> &[ServerSpec] {
        &self.servers
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    async fn open(spec: &ServerSpec) -> Result<McpClient, McpError> {
        let connect_error = |message: String| McpError::Connect {
            server: spec.name.clone(),
            message,
        };

        let connecting = async {
            match &spec.transport {
                ServerTransport::Stdio { command, args, env } => {
                    let mut cmd = Command::new(command);
                    // The child inherits our environment; entries from the config win
                    cmd.args(args).envs(env);
                    let transport = TokioChildProcess::new(cmd).map_err(|e| connect_error(e.to_string()))?;
                    ().serve(transport).await.map_err(|e| connect_error(e.to_string()))
                }
                ServerTransport::Http { url } => {
                    let config = StreamableHttpClientTransportConfig::with_uri(url.as_str());
                    let transport = StreamableHttpClientTransport::from_config(config);
                    ().serve(transport).await.map_err(|e| connect_error(e.to_string()))
                }
            }
        };

        let limit = spec.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        match tokio::time::timeout(limit, connecting).await {
            Ok(result) => result,
            Err(_) => Err(McpError::Timeout {
                server: spec.name.clone(),
                secs: limit.as_secs_f64(),
            }),
        }
    }

    /// Connect to every server in order
    ///
    /// If any server fails, the ones already connected are shut down again and
    /// the error is returned.
    pub async fn connect(&mut self) -> Result<(), McpError> {
        if self.connected {
            return Ok(());
        }

        for spec in self.servers.clone() {
            log::info!("connecting to MCP server '{}'", spec.name);
            let result = match Self::open(&spec).await {
                Ok(client) => match client.list_all_tools().await {
                    Ok(tools) => Ok((client, tools)),
                    Err(e) => {
                        client.cancellation_token().cancel();
                        Err(McpError::Connect {
                            server: spec.name.clone(),
                            message: format!("listing tools failed: {}", e),
                        })
                    }
                },
                Err(e) => Err(e),
            };

            match result {
                Ok((client, tools)) => {
                    log::info!("MCP server '{}' offers {} tools", spec.name, tools.len());
                    self.connections.push(Connection {
                        spec,
                        client: Arc::new(client),
                        tools,
                    });
                }
                Err(e) => {
                    log::warn!("{}; closing {} open connections", e, self.connections.len());
                    self.close_all();
                    return Err(e);
                }
            }
        }

        self.connected = true;
        Ok(())
    }

    fn close_all(&mut self) {
        for connection in self.connections.drain(..) {
            connection.client.cancellation_token().cancel();
        }
    }

    /// Shut down every connection
    pub async fn disconnect(&mut self) {
        self.close_all();
        self.connected = false;
    }

    /// Every tool from every connected server, named uniquely
    ///
    /// A tool whose name was already taken by an earlier server is exposed as
    /// `<server>_<tool>`.
    pub fn get_all_tools(&self) -> Result<Vec<Arc<dyn Tool>>, McpError> {
        if !self.connected {
            return Err(McpError::NotConnected);
        }

        let mut seen = HashSet::new();
        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
        for connection in &self.connections {
            for remote in &connection.tools {
                let remote_name = remote.name.to_string();
                let name = unique_name(&mut seen, &connection.spec.name, &remote_name);
                tools.push(Arc::new(McpTool::new(
                    name,
                    remote_name,
                    connection.spec.name.clone(),
                    remote.description.as_ref().map(|d| d.to_string()).unwrap_or_default(),
                    serde_json::Value::Object(remote.input_schema.as_ref().clone()),
                    connection.client.clone(),
                    connection.spec.timeout,
                )));
            }
        }
        Ok(tools)
    }

    /// Registry holding every MCP tool
    pub fn registry(&self) -> Result<ToolRegistry, McpError> {
        let mut registry = ToolRegistry::new();
        for tool in self.get_all_tools()? {
            registry.register_arc(tool);
        }
        Ok(registry)
    }
}

impl Drop for McpToolkitManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn unique_name(seen: &mut HashSet<String>, server: &str, tool: &str) -> String {
    if seen.insert(tool.to_string()) {
        return tool.to_string();
    }
    let mut candidate = format!("{}_{}", server, tool);
    let mut n = 2;
    while !seen.insert(candidate.clone()) {
        candidate = format!("{}_{}_{}", server, tool, n);
        n += 1;
    }
    log::warn!("MCP tool '{}' from '{}' renamed to '{}'", tool, server, candidate);
    candidate
}
