#![allow(dead_code)]

use std::collections::HashMap;

use owl_toolcore::{ParameterDefinition, Tool, ToolContext, ToolParameters, ToolResult};
use tempfile::TempDir;

/// Configurable tool used across registry tests
#[derive(Debug, Clone)]
pub struct TestTool {
    name: String,
    description: String,
    parameters: HashMap<String, ParameterDefinition>,
    should_fail: bool,
}

impl TestTool {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: HashMap::new(),
            should_fail: false,
        }
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, ParameterDefinition>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait::async_trait]
impl Tool for TestTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        self.parameters.clone()
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        if self.should_fail {
            ToolResult::error("Test tool failed intentionally".to_string())
        } else {
            ToolResult::success(format!("Executed {} with {} parameters", self.name, params.data.len()))
        }
    }
}

pub struct TestFixtures {
    pub temp_dir: TempDir,
}

impl TestFixtures {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn context(&self) -> ToolContext {
        ToolContext::new(self.temp_dir.path().to_path_buf(), "test_session".to_string())
    }
}

pub fn parameter(name: &str, param_type: &str, required: bool) -> (String, ParameterDefinition) {
    (
        name.to_string(),
        ParameterDefinition {
            param_type: param_type.to_string(),
            description: format!("Test parameter {}", name),
            required,
            default: None,
        },
    )
}
