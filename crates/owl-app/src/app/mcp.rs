use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use owl_agents::{run_society, SocietyResult};
use owl_mcp::{McpToolkitManager, ServerTransport};

use crate::app::setup::{self, Roles};
use crate::artifacts::{save_run_artifacts, slugify};
use crate::config::{society_clients, OwlConfig};

/// Solve `task` with the tools of every server in the MCP config
pub async fn run_mcp_mode(
    mut config: OwlConfig,
    mcp_config: Option<PathBuf>,
    task: String,
    round_limit: Option<usize>,
    with_toolkits: bool,
) -> Result<()> {
    if let Some(round_limit) = round_limit {
        config.round_limit = round_limit;
    }
    config.validate()?;

    let path = mcp_config
        .or_else(|| config.mcp_config.clone())
        .context("No MCP config given; pass --config or set mcp_config")?;

    setup::print_banner("MCP Mode", &config);
    let mut manager = McpToolkitManager::from_config(&path)?;
    for server in manager.servers() {
        let target = match &server.transport {
            ServerTransport::Stdio { command, args, .. } => format!("{} {}", command, args.join(" ")),
            ServerTransport::Http { url } => url.clone(),
        };
        println!("{}", format!("  {} → {}", server.name, target).bright_black());
    }
    println!("{}", format!("Task: {}", task).bright_yellow());

    manager.connect().await?;
    let outcome = solve(&config, &manager, &task, with_toolkits).await;
    manager.disconnect().await;
    let result = outcome?;

    setup::print_result(&result);
    let stem = format!("mcp_{}", slugify(&task, 40));
    save_run_artifacts(&config.output_dir, &stem, &task, &result)?;
    Ok(())
}

async fn solve(
    config: &OwlConfig,
    manager: &McpToolkitManager,
    task: &str,
    with_toolkits: bool,
) -> Result<SocietyResult> {
    let mut registry = manager.registry()?;
    if with_toolkits {
        registry.merge(setup::builtin_registry(config)?);
    }
    println!(
        "{}",
        format!("{} tools available: {}", registry.len(), registry.get_tool_names().join(", ")).bright_black()
    );

    let clients = society_clients(config)?;
    let logger = setup::open_logger(&config.work_dir, "owl-mcp").await;
    let mut society = setup::build_society(
        config,
        task,
        clients,
        Some(Arc::new(registry)),
        Roles::default(),
        logger.clone(),
    )?;
    let result = run_society(&mut society, config.round_limit).await;
    setup::close_logger(logger).await;
    result
}
