use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use owl_requirements::AgentCoordinator;

use crate::app::requirements::build_coordinator;
use crate::app::setup::builtin_registry;
use crate::config::{society_clients, OwlConfig};
use crate::web::{AppState, WebServer, WebServerConfig};

/// Shared state for the web frontend, built from `config`
pub fn app_state(config: OwlConfig, coordinator: AgentCoordinator) -> Result<AppState> {
    let (user_client, assistant_client) = society_clients(&config)?;
    let registry = builtin_registry(&config)?;
    Ok(AppState {
        config: Arc::new(config),
        user_client,
        assistant_client,
        registry: Some(Arc::new(registry)),
        coordinator: Arc::new(coordinator),
    })
}

/// Serve the web frontend until the process is stopped
pub async fn run_web_server(
    config: OwlConfig,
    host: Option<String>,
    port: Option<u16>,
    output: Option<PathBuf>,
) -> Result<()> {
    config.validate()?;
    let host = host.unwrap_or_else(|| config.web.host.clone());
    let port = port.unwrap_or(config.web.port);
    let bind_addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", host, port))?;

    let coordinator = build_coordinator(&config, output)?;
    let state = app_state(config, coordinator)?;
    WebServer::new(WebServerConfig { bind_addr }, state).start().await
}
