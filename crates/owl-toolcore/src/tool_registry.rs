use std::collections::HashMap;
use std::sync::Arc;

use owl_llm_api::ToolDefinition;

use crate::tool::{Tool, ToolParameters, ToolResult};
use crate::tool_context::ToolContext;

/// Registry for managing and discovering tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    categories: HashMap<String, Vec<String>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("categories", &self.categories)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            log::debug!("tool '{}' re-registered", name);
        }
    }

    /// Register a tool with categories
    pub fn register_with_categories<T: Tool + 'static>(&mut self, tool: T, categories: Vec<String>) {
        let name = tool.name().to_string();
        self.register(tool);
        self.add_to_categories(&name, categories);
    }

    fn add_to_categories(&mut self, name: &str, categories: Vec<String>) {
        for category in categories {
            let names = self.categories.entry(category).or_default();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    /// Move every tool and category of `other` into this registry
    pub fn merge(&mut self, other: ToolRegistry) {
        for (_, tool) in other.tools {
            self.register_arc(tool);
        }
        for (category, names) in other.categories {
            for name in names {
                self.add_to_categories(&name, vec![category.clone()]);
            }
        }
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tools
    pub fn get_all_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.values().cloned().collect()
    }

    /// Get tools by category
    pub fn get_tools_by_category(&self, category: &str) -> Vec<Arc<dyn Tool>> {
        self.categories
            .get(category)
            .map(|names| names.iter().filter_map(|name| self.tools.get(name)).cloned().collect())
            .unwrap_or_default()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool names, sorted
    pub fn get_tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute_tool(&self, name: &str, params: ToolParameters, context: &ToolContext) -> ToolResult {
        match self.get_tool(name) {
            Some(tool) => tool.execute(params, context).await,
            None => ToolResult::error(format!("Tool '{}' not found", name)),
        }
    }

    /// Tool definitions for the LLM client, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<_> = self.tools.iter().collect();
        // Stable ordering keeps the request prefix identical across turns
        tools.sort_by_key(|(name, _)| name.as_str());
        tools.into_iter().map(|(_, tool)| tool.to_definition()).collect()
    }

    /// Get all tool definitions in OpenAI format
    pub fn get_openai_tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<_> = self.tools.iter().collect();
        tools.sort_by_key(|(name, _)| name.as_str());
        tools.into_iter().map(|(_, tool)| tool.to_openai_definition()).collect()
    }

    /// Get categories, sorted
    pub fn get_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.categories.keys().cloned().collect();
        categories.sort();
        categories
    }
}
