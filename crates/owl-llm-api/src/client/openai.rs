use crate::client::{ChatMessage, LlmClient, LlmResponse, TokenUsage, ToolDefinition};
use crate::config::ModelSettings;
use crate::error::LlmError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default = "default_role")]
    role: String,
    #[serde(default, deserialize_with = "owl_null_string")]
    content: String,
    tool_calls: Option<Vec<crate::client::ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

fn default_role() -> String {
    "assistant".to_string()
}

fn owl_null_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol
pub struct OpenAiCompatibleClient {
    provider: &'static str,
    api_key: String,
    model: String,
    api_url: String,
    agent_name: String,
    settings: ModelSettings,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(
        provider: &'static str,
        api_key: String,
        model: String,
        api_url: String,
        agent_name: String,
        settings: ModelSettings,
    ) -> Self {
        Self {
            provider,
            api_key,
            model,
            api_url,
            agent_name,
            settings,
            client: reqwest::Client::new(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_chat_request(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Value {
        let mut request = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if let Some(temperature) = self.settings.temperature {
            request["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            request["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !tools.is_empty() {
            let tool_definitions: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            request["tools"] = Value::Array(tool_definitions);
            request["tool_choice"] = Value::String("auto".to_string());
        }

        request
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Result<LlmResponse> {
        let request = self.build_chat_request(&messages, &tools);

        owl_logging::log_request(
            &self.api_url,
            &request,
            &self.api_key,
            log::log_enabled!(log::Level::Trace),
        );
        if self.settings.log_requests {
            if let Err(e) = owl_logging::log_request_to_file(
                &self.api_url,
                &request,
                &self.model,
                &self.agent_name,
                &self.api_key,
            ) {
                log::warn!("request log failed: {}", e);
            }
        }
        log::debug!(
            "[{}] POST {} ({} messages, {} tools)",
            self.agent_name,
            self.api_url,
            messages.len(),
            tools.len()
        );

        let mut builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .timeout(self.settings.timeout());
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.json(&request).send().await.map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: self.provider,
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let response_text = response.text().await.map_err(LlmError::from)?;
        let chat_response: ChatResponse =
            serde_json::from_str(&response_text).map_err(LlmError::from)?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse(self.provider))?;

        let message = ChatMessage {
            role: choice.message.role,
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.filter(|calls| !calls.is_empty()),
            tool_call_id: None,
            name: None,
        };

        Ok(LlmResponse {
            message,
            usage: chat_response
                .usage
                .map(|usage| TokenUsage::from_counts(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens)),
        })
    }
}
