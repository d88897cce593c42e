use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use owl_toolcore::{ParameterDefinition, Tool, ToolContext, ToolParameters, ToolResult};
use rmcp::model::{CallToolRequestParams, CallToolResult, RawContent, ResourceContents};
use rmcp::service::RunningService;
use rmcp::RoleClient;
use serde_json::Value;

pub(crate) type McpClient = RunningService<RoleClient, ()>;

/// Drop schema keywords some providers reject
pub(crate) fn sanitize_schema(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("definitions");
            map.remove("$ref");
            map.remove("additionalProperties");
            for (_, v) in map.iter_mut() {
                sanitize_schema(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sanitize_schema),
        _ => {}
    }
}

/// Flatten an MCP call result into the text handed back to the model
pub(crate) fn render_call_result(result: &CallToolResult) -> String {
    let mut parts = Vec::new();
    for content in &result.content {
        let raw: &RawContent = content.deref();
        match raw {
            RawContent::Text(text) => parts.push(text.text.clone()),
            RawContent::Image(image) => parts.push(format!(
                "[Image: {} bytes, mime: {}]",
                image.data.len(),
                image.mime_type
            )),
            RawContent::Resource(resource) => match &resource.resource {
                ResourceContents::TextResourceContents { text, .. } => parts.push(text.clone()),
                ResourceContents::BlobResourceContents { uri, .. } => parts.push(format!("[Resource: {}]", uri)),
            },
            RawContent::Audio(_) => parts.push("[Audio content]".to_string()),
            RawContent::ResourceLink(link) => parts.push(format!("[ResourceLink: {}]", link.uri)),
        }
    }
    if parts.is_empty() {
        if let Some(structured) = &result.structured_content {
            return structured.to_string();
        }
    }
    parts.join("\n")
}

/// A tool served by a connected MCP server
pub struct McpTool {
    name: String,
    remote_name: String,
    server: String,
    description: String,
    input_schema: Value,
    client: Arc<McpClient>,
    timeout: Option<Duration>,
}

impl McpTool {
    pub(crate) fn new(
        name: String,
        remote_name: String,
        server: String,
        description: String,
        mut input_schema: Value,
        client: Arc<McpClient>,
        timeout: Option<Duration>,
    ) -> Self {
        sanitize_schema(&mut input_schema);
        if !input_schema.is_object() {
            input_schema = serde_json::json!({"type": "object", "properties": {}});
        }
        Self {
            name,
            remote_name,
            server,
            description,
            input_schema,
            client,
            timeout,
        }
    }

    /// Name of the server this tool lives on
    pub fn server(&self) -> &str {
        &self.server
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        let required: Vec<&str> = self.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        self.input_schema["properties"]
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| {
                        (
                            name.clone(),
                            ParameterDefinition {
                                param_type: prop["type"].as_str().unwrap_or("string").to_string(),
                                description: prop["description"].as_str().unwrap_or_default().to_string(),
                                required: required.contains(&name.as_str()),
                                default: prop.get("default").cloned(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parameters_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn execute(&self, params: ToolParameters, _context: &ToolContext) -> ToolResult {
        let arguments = match params.to_value() {
            Value::Object(map) => Some(map),
            _ => None,
        };
        let mut request = CallToolRequestParams::new(self.remote_name.clone());
        request.arguments = arguments;

        log::debug!("calling MCP tool {} on {}", self.remote_name, self.server);
        let call = self.client.call_tool(request);
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return ToolResult::error(format!(
                        "MCP tool '{}' timed out after {:?}",
                        self.name, limit
                    ))
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(result) => {
                let text = render_call_result(&result);
                if result.is_error.unwrap_or(false) {
                    ToolResult::error(text)
                } else {
                    ToolResult::success(text)
                }
            }
            Err(e) => ToolResult::error(format!("MCP tool '{}' failed: {}", self.name, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_schema_recurses() {
        let mut schema = serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "url": {"type": "string", "additionalProperties": false},
                "items": {"type": "array", "items": [{"$ref": "#/definitions/x"}]}
            },
            "definitions": {}
        });
        sanitize_schema(&mut schema);
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("definitions").is_none());
        assert!(schema["properties"]["url"].get("additionalProperties").is_none());
        assert!(schema["properties"]["items"]["items"][0].get("$ref").is_none());
        assert_eq!(schema["type"], "object");
    }
}
