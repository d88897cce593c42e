use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use owl_agents::{RolePlaying, SharedLogger, SocietyResult};
use owl_llm_api::LlmClient;
use owl_logging::ConversationLogger;
use owl_toolcore::{ToolContext, ToolRegistry};

use crate::config::OwlConfig;

/// Role names for one society
#[derive(Debug, Clone, Copy)]
pub struct Roles<'a> {
    pub user: &'a str,
    pub assistant: &'a str,
}

impl Default for Roles<'_> {
    fn default() -> Self {
        Self {
            user: "user",
            assistant: "assistant",
        }
    }
}

/// Open a JSONL conversation log under `<work_dir>/logs`; failures only disable logging
pub async fn open_logger(work_dir: &Path, prefix: &str) -> Option<SharedLogger> {
    match ConversationLogger::new(work_dir, prefix).await {
        Ok(logger) => {
            log::info!("conversation log: {}", logger.path().display());
            Some(Arc::new(tokio::sync::Mutex::new(logger)))
        }
        Err(e) => {
            eprintln!("{} Conversation logging disabled: {}", "⚠️".yellow(), e);
            None
        }
    }
}

pub async fn close_logger(logger: Option<SharedLogger>) {
    if let Some(logger) = logger {
        logger.lock().await.shutdown().await;
    }
}

pub fn tool_context(config: &OwlConfig) -> ToolContext {
    ToolContext::new(
        config.work_dir.clone(),
        format!("session_{}", chrono::Utc::now().timestamp()),
    )
}

/// The built-in toolkits named in `config`
pub fn builtin_registry(config: &OwlConfig) -> Result<ToolRegistry> {
    owl_tools::build_registry(&config.toolkits, &config.output_dir)
}

/// Assemble a role-playing society from `config`
pub fn build_society(
    config: &OwlConfig,
    task: &str,
    clients: (Arc<dyn LlmClient>, Arc<dyn LlmClient>),
    registry: Option<Arc<ToolRegistry>>,
    roles: Roles<'_>,
    logger: Option<SharedLogger>,
) -> Result<RolePlaying> {
    let (user_client, assistant_client) = clients;
    let mut builder = RolePlaying::builder(task, user_client, assistant_client)
        .user_role_name(roles.user)
        .assistant_role_name(roles.assistant)
        .output_language(config.language.clone())
        .max_tool_iterations(config.max_tool_iterations);

    if let Some(registry) = registry.filter(|r| !r.is_empty()) {
        builder = builder.tools(registry, tool_context(config));
    }
    if let Some(logger) = logger {
        builder = builder.logger(logger);
    }
    builder.build()
}

pub fn print_banner(title: &str, config: &OwlConfig) {
    println!("{}", format!("🦉 OWL - {}", title).bright_cyan().bold());
    println!("{}", format!("Model: {}", config.model).bright_black());
    if let Some(language) = &config.language {
        println!("{}", format!("Output language: {}", language).bright_black());
    }
}

pub fn print_result(result: &SocietyResult) {
    println!();
    println!("{}", "Answer:".bright_green().bold());
    println!("{}", result.answer.bright_blue());
    println!();
    println!(
        "{}",
        format!(
            "{} rounds, {} prompt + {} completion tokens",
            result.chat_history.len(),
            result.token_info.prompt_token_count,
            result.token_info.completion_token_count
        )
        .bright_black()
    );
}
