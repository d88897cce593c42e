//! Scripted client for exercising agents without a live provider.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::client::{ChatMessage, FunctionCall, LlmClient, LlmResponse, TokenUsage, ToolCall, ToolDefinition};

/// One recorded `chat` invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// Returns queued responses in order and records what it was asked
#[derive(Default)]
pub struct ScriptedLlmClient {
    model: String,
    responses: Mutex<VecDeque<Result<LlmResponse, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            ..Default::default()
        }
    }

    /// Queue a plain assistant reply
    pub fn push_text(&self, content: impl Into<String>) -> &Self {
        self.push_response(LlmResponse {
            message: ChatMessage::assistant(content),
            usage: None,
        })
    }

    /// Queue a plain assistant reply carrying token usage
    pub fn push_text_with_usage(&self, content: impl Into<String>, prompt: u32, completion: u32) -> &Self {
        self.push_response(LlmResponse {
            message: ChatMessage::assistant(content),
            usage: Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
        })
    }

    /// Queue an assistant turn requesting a single tool call
    pub fn push_tool_call(&self, id: &str, name: &str, arguments: serde_json::Value) -> &Self {
        let mut message = ChatMessage::assistant("");
        message.tool_calls = Some(vec![ToolCall {
            id: id.to_string(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }]);
        self.push_response(LlmResponse { message, usage: None })
    }

    /// Queue a provider failure
    pub fn push_error(&self, error: impl Into<String>) -> &Self {
        self.lock_responses().push_back(Err(error.into()));
        self
    }

    pub fn push_response(&self, response: LlmResponse) -> &Self {
        self.lock_responses().push_back(Ok(response));
        self
    }

    /// Everything sent to `chat` so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.lock_responses().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<LlmResponse, String>>> {
        match self.responses.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Result<LlmResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall { messages, tools });
        }
        match self.lock_responses().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(anyhow::anyhow!(error)),
            None => Err(anyhow::anyhow!("scripted client has no responses left")),
        }
    }
}
