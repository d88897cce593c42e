use std::sync::Arc;

use anyhow::Result;
use owl_llm_api::{ChatMessage, LlmClient, TokenUsage, ToolCall, ToolDefinition};
use owl_logging::{safe_truncate, ConversationLogger};
use owl_toolcore::{ToolContext, ToolParameters, ToolRegistry, ToolResult};
use owl_types::{ToolCallRecord, MAX_TOOL_ITERATIONS};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::prompts;

/// Conversation log shared by the agents of one run
pub type SharedLogger = Arc<Mutex<ConversationLogger>>;

/// Bookkeeping for one agent step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepInfo {
    /// Summed over every model call made during the step
    pub usage: TokenUsage,
    pub tool_calls: Vec<ToolCallRecord>,
    pub termination_reasons: Vec<String>,
}

/// What an agent produced for one input message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentResponse {
    pub msgs: Vec<ChatMessage>,
    pub terminated: bool,
    pub info: StepInfo,
}

impl AgentResponse {
    pub fn msg(&self) -> Option<&ChatMessage> {
        self.msgs.first()
    }

    /// Content of the first message, empty when there is none
    pub fn content(&self) -> &str {
        self.msg().map(|m| m.content.as_str()).unwrap_or("")
    }
}

/// An LLM conversation with a fixed system message and optional tools
pub struct ChatAgent {
    name: String,
    system_message: ChatMessage,
    memory: Vec<ChatMessage>,
    client: Arc<dyn LlmClient>,
    tools: Option<Arc<ToolRegistry>>,
    tool_context: ToolContext,
    max_tool_iterations: usize,
    logger: Option<SharedLogger>,
}

impl ChatAgent {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            system_message: ChatMessage::system(system_prompt),
            memory: Vec::new(),
            client,
            tools: None,
            tool_context: ToolContext::default(),
            max_tool_iterations: MAX_TOOL_ITERATIONS,
            logger: None,
        }
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>, context: ToolContext) -> Self {
        self.tools = Some(tools);
        self.tool_context = context;
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    pub fn with_output_language(mut self, language: &str) -> Self {
        self.system_message.content.push_str(&prompts::output_language_suffix(language));
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_message(&self) -> &ChatMessage {
        &self.system_message
    }

    /// Messages exchanged so far, without the system message
    pub fn memory(&self) -> &[ChatMessage] {
        &self.memory
    }

    pub fn reset(&mut self) {
        self.memory.clear();
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.as_ref().map(|t| t.definitions()).unwrap_or_default()
    }

    /// Feed one message from the other side and run until the model answers
    ///
    /// Tool calls requested by the model are executed and their results fed
    /// back, at most `max_tool_iterations` times. The step terminates when the
    /// model replies with neither content nor tool calls, or when the bound is
    /// reached.
    pub async fn step(&mut self, input: &ChatMessage) -> Result<AgentResponse> {
        self.memory.push(ChatMessage::user(input.content.clone()));

        let definitions = self.tool_definitions();
        let mut info = StepInfo::default();

        for iteration in 0..self.max_tool_iterations {
            let mut messages = Vec::with_capacity(self.memory.len() + 2);
            messages.push(self.system_message.clone());
            messages.extend(self.memory.iter().cloned());

            let remaining = self.max_tool_iterations - iteration;
            if !definitions.is_empty() && remaining <= 2 && self.max_tool_iterations > 2 {
                messages.push(ChatMessage::system(prompts::iteration_warning(remaining)));
            }

            let response = self.client.chat(messages, definitions.clone()).await?;
            if let Some(usage) = &response.usage {
                info.usage.add(usage);
            }
            let mut message = response.message;
            message.role = "assistant".to_string();

            if let Some(calls) = message.tool_calls.clone().filter(|c| !c.is_empty()) {
                log::info!("[{}] model requested {} tool call(s)", self.name, calls.len());
                self.log_tool_request(&message.content, &calls).await;
                self.memory.push(message);

                for call in &calls {
                    let (record, result) = self.run_tool_call(call).await;
                    self.memory.push(ChatMessage::tool(
                        call.id.clone(),
                        call.function.name.clone(),
                        result.to_model_text(),
                    ));
                    info.tool_calls.push(record);
                }
                continue;
            }

            if message.content.trim().is_empty() {
                log::warn!("[{}] model returned an empty reply", self.name);
                info.termination_reasons.push("empty_response".to_string());
                return Ok(AgentResponse {
                    msgs: Vec::new(),
                    terminated: true,
                    info,
                });
            }

            self.memory.push(message.clone());
            return Ok(AgentResponse {
                msgs: vec![message],
                terminated: false,
                info,
            });
        }

        log::warn!(
            "[{}] stopped after {} tool iterations without a final reply",
            self.name,
            self.max_tool_iterations
        );
        info.termination_reasons.push("max_tool_iterations".to_string());
        Ok(AgentResponse {
            msgs: Vec::new(),
            terminated: true,
            info,
        })
    }

    async fn run_tool_call(&self, call: &ToolCall) -> (ToolCallRecord, ToolResult) {
        let name = &call.function.name;
        let raw_args = &call.function.arguments;
        log::info!("[{}] calling {} with {}", self.name, name, safe_truncate(raw_args, 100));

        let (args, result) = match ToolParameters::from_json(raw_args) {
            Ok(params) => {
                let args = params.to_value();
                let result = match &self.tools {
                    Some(registry) => registry.execute_tool(name, params, &self.tool_context).await,
                    None => ToolResult::error(format!("Tool '{}' not found", name)),
                };
                (args, result)
            }
            Err(e) => (
                serde_json::Value::String(raw_args.clone()),
                ToolResult::error(format!("Failed to parse tool arguments: {}", e)),
            ),
        };

        let text = result.to_model_text();
        if result.success {
            log::debug!("[{}] {} -> {}", self.name, name, safe_truncate(&text, 200));
        } else {
            log::warn!("[{}] {} failed: {}", self.name, name, safe_truncate(&text, 200));
        }
        if let Some(logger) = &self.logger {
            logger.lock().await.log_tool_result(&text, &call.id, name, None).await;
        }

        (
            ToolCallRecord {
                tool_name: name.clone(),
                args,
                result: text,
                tool_call_id: call.id.clone(),
            },
            result,
        )
    }

    async fn log_tool_request(&self, content: &str, calls: &[ToolCall]) {
        let Some(logger) = &self.logger else {
            return;
        };
        let calls = calls
            .iter()
            .map(|c| (c.id.clone(), c.function.name.clone(), c.function.arguments.clone()))
            .collect();
        logger
            .lock()
            .await
            .log_with_tool_calls(content, None, Some(&self.name), calls)
            .await;
    }
}
