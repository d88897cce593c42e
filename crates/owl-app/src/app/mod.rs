//! Command handlers behind the `owl` subcommands.

pub mod mcp;
pub mod requirements;
pub mod setup;
pub mod stock;
pub mod task;
pub mod tools;
pub mod web_server;

use anyhow::Result;

use crate::cli::{Commands, RequirementsMode};
use crate::config::OwlConfig;

pub use task::RunOverrides;

/// Run the handler for `command`
pub async fn dispatch(command: Commands, config: OwlConfig) -> Result<()> {
    match command {
        Commands::Run {
            task,
            model,
            user_model,
            round_limit,
            language,
            toolkits,
            output_dir,
        } => {
            let overrides = RunOverrides {
                model,
                user_model,
                round_limit,
                language,
                toolkits,
                output_dir,
            };
            task::run_task_mode(config, task, overrides).await
        }
        Commands::Mcp {
            config: mcp_config,
            task,
            round_limit,
            with_toolkits,
        } => mcp::run_mcp_mode(config, mcp_config, task, round_limit, with_toolkits).await,
        Commands::Requirements {
            mode,
            input,
            host,
            port,
            output,
        } => match mode {
            RequirementsMode::Cli => {
                config.validate()?;
                let coordinator = requirements::build_coordinator(&config, output)?;
                requirements::run_requirements_cli(coordinator, input).await
            }
            RequirementsMode::Web => web_server::run_web_server(config, host, port, output).await,
        },
        Commands::Stock { company, round_limit } => stock::run_stock_mode(config, company, round_limit).await,
        Commands::Web { host, port } => web_server::run_web_server(config, host, port, None).await,
        Commands::Tools { mcp_config } => tools::list_tools(config, mcp_config).await,
    }
}
