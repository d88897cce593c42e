use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use owl_mcp::McpToolkitManager;
use owl_toolcore::ToolRegistry;

use crate::config::OwlConfig;

/// One line per tool, grouped by category
pub fn describe_registry(registry: &ToolRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    for category in registry.get_categories() {
        lines.push(format!("[{}]", category));
        let mut tools = registry.get_tools_by_category(&category);
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        for tool in tools {
            lines.push(format!("  {:<28} {}", tool.name(), tool.description()));
        }
    }
    lines
}

/// Print every built-in tool, plus MCP tools when a config is given
pub async fn list_tools(config: OwlConfig, mcp_config: Option<PathBuf>) -> Result<()> {
    let registry = owl_tools::full_registry(&config.output_dir);
    println!("{}", "Built-in toolkits".bright_cyan().bold());
    for line in describe_registry(&registry) {
        println!("{}", line);
    }

    let Some(path) = mcp_config.or(config.mcp_config) else {
        return Ok(());
    };
    let mut manager = McpToolkitManager::from_config(&path)?;
    manager.connect().await?;
    let tools = manager.get_all_tools();
    manager.disconnect().await;

    println!();
    println!("{}", format!("MCP tools ({})", path.display()).bright_cyan().bold());
    for tool in tools? {
        println!("  {:<28} {}", tool.name(), tool.description());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_registry_groups_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let registry = owl_tools::full_registry(dir.path());
        let lines = describe_registry(&registry);
        let file_header = lines.iter().position(|l| l == "[file]").unwrap();
        assert!(lines[file_header + 1].trim_start().starts_with("write_to_file"));
        assert!(lines.iter().any(|l| l.trim_start().starts_with("search_wiki")));
    }
}
