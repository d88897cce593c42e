use anyhow::Result;
use async_trait::async_trait;
use owl_llm_api::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::tool_context::ToolContext;

/// Tool parameters
#[derive(Debug, Clone, Default)]
pub struct ToolParameters {
    pub data: HashMap<String, Value>,
}

impl ToolParameters {
    pub fn from_json(json_str: &str) -> Result<Self> {
        if json_str.trim().is_empty() {
            return Ok(Self::default());
        }
        let data: HashMap<String, Value> = serde_json::from_str(json_str)?;
        Ok(Self { data })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                data: map.into_iter().collect(),
            }),
            Value::Null => Ok(Self::default()),
            other => Err(anyhow::anyhow!("Tool arguments must be a JSON object, got {}", other)),
        }
    }

    pub fn get_required<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Required parameter '{}' missing", key))?;

        serde_json::from_value(value.clone())
            .map_err(|e| anyhow::anyhow!("Failed to parse parameter '{}': {}", key, e))
    }

    pub fn get_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.data.get(key) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => {
                let parsed: T = serde_json::from_value(value.clone())
                    .map_err(|e| anyhow::anyhow!("Failed to parse parameter '{}': {}", key, e))?;
                Ok(Some(parsed))
            }
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone().into_iter().collect())
    }
}

/// Tool execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(content: String) -> Self {
        Self {
            success: true,
            content,
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: Some(error),
        }
    }

    /// Text handed back to the model as the tool message
    pub fn to_model_text(&self) -> String {
        match &self.error {
            Some(error) if !self.success => format!("Error: {}", error),
            _ => self.content.clone(),
        }
    }
}

/// Tool parameter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub param_type: String,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

/// Tool trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name of the tool (must be unique)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Parameter definitions
    fn parameters(&self) -> HashMap<String, ParameterDefinition>;

    /// Execute the tool
    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult;

    /// JSON schema of the parameters object
    fn parameters_schema(&self) -> Value {
        let mut params: Vec<_> = self.parameters().into_iter().collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for (name, param_def) in params {
            let mut param_json = serde_json::json!({
                "type": param_def.param_type,
                "description": param_def.description,
            });
            if let Some(default) = param_def.default {
                param_json["default"] = default;
            }
            if param_def.required {
                required.push(name.clone());
            }
            properties.insert(name, param_json);
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    /// Definition handed to the LLM client
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Get OpenAI-compatible tool definition
    fn to_openai_definition(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters_schema()
            }
        })
    }
}

/// Helper macro for creating parameter definitions
#[macro_export]
macro_rules! param {
    ($name:expr, $type:expr, $desc:expr, required) => {
        (
            $name.to_string(),
            $crate::ParameterDefinition {
                param_type: $type.to_string(),
                description: $desc.to_string(),
                required: true,
                default: None,
            },
        )
    };
    ($name:expr, $type:expr, $desc:expr, optional, $default:expr) => {
        (
            $name.to_string(),
            $crate::ParameterDefinition {
                param_type: $type.to_string(),
                description: $desc.to_string(),
                required: false,
                default: Some(serde_json::Value::from($default)),
            },
        )
    };
    ($name:expr, $type:expr, $desc:expr, optional) => {
        (
            $name.to_string(),
            $crate::ParameterDefinition {
                param_type: $type.to_string(),
                description: $desc.to_string(),
                required: false,
                default: None,
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_from_json() {
        let params = ToolParameters::from_json(r#"{"entity": "Rust", "limit": 3}"#).unwrap();
        let entity: String = params.get_required("entity").unwrap();
        let limit: Option<u32> = params.get_optional("limit").unwrap();
        let missing: Option<String> = params.get_optional("missing").unwrap();
        assert_eq!(entity, "Rust");
        assert_eq!(limit, Some(3));
        assert_eq!(missing, None);
        assert!(params.get_required::<String>("missing").is_err());
    }

    #[test]
    fn test_parameters_from_empty_and_invalid() {
        assert!(ToolParameters::from_json("").unwrap().data.is_empty());
        assert!(ToolParameters::from_json("[1, 2]").is_err());
        assert!(ToolParameters::from_value(serde_json::json!("text")).is_err());
    }

    #[test]
    fn test_null_optional_is_none() {
        let params = ToolParameters::from_json(r#"{"language": null}"#).unwrap();
        let language: Option<String> = params.get_optional("language").unwrap();
        assert_eq!(language, None);
    }

    #[test]
    fn test_result_model_text() {
        assert_eq!(ToolResult::success("ok".to_string()).to_model_text(), "ok");
        assert_eq!(ToolResult::error("boom".to_string()).to_model_text(), "Error: boom");
    }

    #[test]
    fn test_param_macro() {
        let (name, def) = param!("code", "string", "Code to run", required);
        assert_eq!(name, "code");
        assert!(def.required);
        let (_, def) = param!("language", "string", "Language", optional, "python");
        assert_eq!(def.default, Some(Value::from("python")));
    }
}
