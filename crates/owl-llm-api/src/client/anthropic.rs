use crate::client::{ChatMessage, FunctionCall, LlmClient, LlmResponse, TokenUsage, ToolCall, ToolDefinition};
use crate::config::ModelSettings;
use crate::error::LlmError;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic LLM client implementation using native Anthropic API
pub struct AnthropicClient {
    api_key: String,
    model: String,
    base_url: String,
    agent_name: String,
    settings: ModelSettings,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        agent_name: String,
        settings: ModelSettings,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            api_key,
            model,
            base_url,
            agent_name,
            settings,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        if self.base_url.ends_with("/v1/messages") {
            self.base_url.clone()
        } else {
            format!("{}/v1/messages", self.base_url)
        }
    }

    fn convert_messages(messages: Vec<ChatMessage>) -> Vec<Value> {
        messages
            .into_iter()
            .filter(|msg| msg.role != "system")
            .map(|msg| {
                // Anthropic only knows user/assistant; tool results ride on user turns
                let role = if msg.role == "assistant" { "assistant" } else { "user" };

                let content = if msg.role == "tool" {
                    vec![serde_json::json!({
                        "type": "tool_result",
                        "tool_use_id": msg.tool_call_id.unwrap_or_default(),
                        "content": msg.content
                    })]
                } else if let Some(tool_calls) = msg.tool_calls {
                    let mut content = vec![];
                    if !msg.content.is_empty() {
                        content.push(serde_json::json!({"type": "text", "text": msg.content}));
                    }
                    for tool_call in tool_calls {
                        content.push(serde_json::json!({
                            "type": "tool_use",
                            "id": tool_call.id,
                            "name": tool_call.function.name,
                            "input": serde_json::from_str::<Value>(&tool_call.function.arguments)
                                .unwrap_or_else(|_| serde_json::json!({}))
                        }));
                    }
                    content
                } else {
                    vec![serde_json::json!({"type": "text", "text": msg.content})]
                };

                serde_json::json!({"role": role, "content": content})
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.parameters
                })
            })
            .collect()
    }

    fn build_request(&self, messages: Vec<ChatMessage>, tools: &[ToolDefinition]) -> Value {
        let system: Vec<String> = messages
            .iter()
            .filter(|msg| msg.role == "system")
            .map(|msg| msg.content.clone())
            .collect();

        let mut request = serde_json::json!({
            "model": self.model,
            "messages": Self::convert_messages(messages),
            "max_tokens": self.settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        if !system.is_empty() {
            request["system"] = Value::String(system.join("\n\n"));
        }
        if let Some(temperature) = self.settings.temperature {
            request["temperature"] = serde_json::json!(temperature);
        }
        if !tools.is_empty() {
            request["tools"] = Value::Array(Self::convert_tools(tools));
            request["tool_choice"] = serde_json::json!({"type": "auto"});
        }

        request
    }

    fn parse_response(response: &Value) -> ChatMessage {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for item in response["content"].as_array().into_iter().flatten() {
            match item["type"].as_str() {
                Some("text") => {
                    if let Some(text) = item["text"].as_str() {
                        text_content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    if let (Some(id), Some(name)) = (item["id"].as_str(), item["name"].as_str()) {
                        tool_calls.push(ToolCall {
                            id: id.to_string(),
                            tool_type: "function".to_string(),
                            function: FunctionCall {
                                name: name.to_string(),
                                arguments: item["input"].to_string(),
                            },
                        });
                    }
                }
                _ => {}
            }
        }

        ChatMessage {
            role: response["role"].as_str().unwrap_or("assistant").to_string(),
            content: text_content,
            tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
            tool_call_id: None,
            name: None,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Result<LlmResponse> {
        let url = self.messages_url();
        let request = self.build_request(messages, &tools);

        if self.settings.log_requests {
            if let Err(e) = owl_logging::log_request_to_file(
                &url,
                &request,
                &self.model,
                &self.agent_name,
                &self.api_key,
            ) {
                log::warn!("request log failed: {}", e);
            }
        }
        log::debug!("[{}] POST {}", self.agent_name, url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .timeout(self.settings.timeout())
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "Anthropic",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let response_text = response.text().await.map_err(LlmError::from)?;
        let response_json: Value = serde_json::from_str(&response_text).map_err(LlmError::from)?;

        if !response_json["content"].is_array() {
            return Err(LlmError::EmptyResponse("Anthropic").into());
        }

        let message = Self::parse_response(&response_json);
        let usage = response_json.get("usage").map(|u| {
            let input = u["input_tokens"].as_u64().unwrap_or(0);
            let output = u["output_tokens"].as_u64().unwrap_or(0);
            TokenUsage::from_counts(input, output, input.saturating_add(output))
        });

        Ok(LlmResponse { message, usage })
    }
}
