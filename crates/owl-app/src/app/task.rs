use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use owl_agents::run_society;

use crate::app::setup::{self, Roles};
use crate::artifacts::{save_run_artifacts, slugify};
use crate::config::{society_clients, OwlConfig};

/// Flags `owl run` can set over the loaded config
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub model: Option<String>,
    pub user_model: Option<String>,
    pub round_limit: Option<usize>,
    pub language: Option<String>,
    pub toolkits: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
}

impl RunOverrides {
    pub fn apply(self, config: &mut OwlConfig) {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(user_model) = self.user_model {
            config.user_model = Some(user_model);
        }
        if let Some(round_limit) = self.round_limit {
            config.round_limit = round_limit;
        }
        if let Some(language) = self.language {
            config.language = Some(language);
        }
        if let Some(toolkits) = self.toolkits {
            config.toolkits = toolkits;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
    }
}

/// Run in task mode - solve a single task and exit
pub async fn run_task_mode(mut config: OwlConfig, task: String, overrides: RunOverrides) -> Result<()> {
    overrides.apply(&mut config);
    config.validate()?;

    setup::print_banner("Task Mode", &config);
    println!("{}", format!("Task: {}", task).bright_yellow());
    println!();

    let registry = Arc::new(setup::builtin_registry(&config)?);
    log::info!("tools: {}", registry.get_tool_names().join(", "));

    let clients = society_clients(&config)?;
    let logger = setup::open_logger(&config.work_dir, "owl").await;
    let mut society = setup::build_society(
        &config,
        &task,
        clients,
        Some(registry),
        Roles::default(),
        logger.clone(),
    )?;

    let result = run_society(&mut society, config.round_limit).await;
    setup::close_logger(logger).await;
    let result = result?;

    setup::print_result(&result);

    let stem = format!("{}_{}", slugify(&task, 40), chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let (history, summary) = save_run_artifacts(&config.output_dir, &stem, &task, &result)?;
    println!("{}", format!("Chat history: {}", history.display()).green());
    println!("{}", format!("Summary: {}", summary.display()).green());
    Ok(())
}
