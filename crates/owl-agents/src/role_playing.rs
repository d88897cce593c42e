use std::sync::Arc;

use anyhow::{bail, Result};
use owl_llm_api::{ChatMessage, LlmClient};
use owl_toolcore::{ToolContext, ToolRegistry};
use owl_types::TASK_DONE;

use crate::chat_agent::{AgentResponse, ChatAgent, SharedLogger};
use crate::prompts;

/// Outcome of one user/assistant exchange
#[derive(Debug, Clone, Default)]
pub struct RoundResponse {
    pub assistant: AgentResponse,
    pub user: AgentResponse,
    /// Message to hand the user agent next round, with the instruction reminder attached
    pub next_message: Option<ChatMessage>,
}

pub struct RolePlayingBuilder {
    task_prompt: String,
    user_client: Arc<dyn LlmClient>,
    assistant_client: Arc<dyn LlmClient>,
    user_role_name: String,
    assistant_role_name: String,
    output_language: Option<String>,
    tools: Option<(Arc<ToolRegistry>, ToolContext)>,
    max_tool_iterations: Option<usize>,
    logger: Option<SharedLogger>,
}

impl RolePlayingBuilder {
    pub fn user_role_name(mut self, name: impl Into<String>) -> Self {
        self.user_role_name = name.into();
        self
    }

    pub fn assistant_role_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_role_name = name.into();
        self
    }

    pub fn output_language(mut self, language: Option<String>) -> Self {
        self.output_language = language.filter(|l| !l.trim().is_empty());
        self
    }

    /// Tools available to the assistant agent
    pub fn tools(mut self, registry: Arc<ToolRegistry>, context: ToolContext) -> Self {
        self.tools = Some((registry, context));
        self
    }

    pub fn max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = Some(max);
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<RolePlaying> {
        let task_prompt = self.task_prompt.trim().to_string();
        if task_prompt.is_empty() {
            bail!("task prompt must not be empty");
        }

        let mut user_agent = ChatAgent::new(
            self.user_role_name.clone(),
            prompts::user_system_prompt(&task_prompt),
            self.user_client,
        );
        let mut assistant_agent = ChatAgent::new(
            self.assistant_role_name.clone(),
            prompts::assistant_system_prompt(&task_prompt),
            self.assistant_client,
        );

        if let Some(language) = &self.output_language {
            user_agent = user_agent.with_output_language(language);
            assistant_agent = assistant_agent.with_output_language(language);
        }
        if let Some((registry, context)) = self.tools {
            assistant_agent = assistant_agent.with_tools(registry, context);
        }
        if let Some(max) = self.max_tool_iterations {
            user_agent = user_agent.with_max_tool_iterations(max);
            assistant_agent = assistant_agent.with_max_tool_iterations(max);
        }
        if let Some(logger) = &self.logger {
            user_agent = user_agent.with_logger(logger.clone());
            assistant_agent = assistant_agent.with_logger(logger.clone());
        }

        Ok(RolePlaying {
            task_prompt,
            user_role_name: self.user_role_name,
            assistant_role_name: self.assistant_role_name,
            output_language: self.output_language,
            user_agent,
            assistant_agent,
            logger: self.logger,
        })
    }
}

/// A user agent that instructs and an assistant agent that solves, sharing one task
pub struct RolePlaying {
    task_prompt: String,
    user_role_name: String,
    assistant_role_name: String,
    output_language: Option<String>,
    user_agent: ChatAgent,
    assistant_agent: ChatAgent,
    logger: Option<SharedLogger>,
}

impl RolePlaying {
    pub fn builder(
        task_prompt: impl Into<String>,
        user_client: Arc<dyn LlmClient>,
        assistant_client: Arc<dyn LlmClient>,
    ) -> RolePlayingBuilder {
        RolePlayingBuilder {
            task_prompt: task_prompt.into(),
            user_client,
            assistant_client,
            user_role_name: "user".to_string(),
            assistant_role_name: "assistant".to_string(),
            output_language: None,
            tools: None,
            max_tool_iterations: None,
            logger: None,
        }
    }

    pub fn task_prompt(&self) -> &str {
        &self.task_prompt
    }

    pub fn user_role_name(&self) -> &str {
        &self.user_role_name
    }

    pub fn assistant_role_name(&self) -> &str {
        &self.assistant_role_name
    }

    pub fn output_language(&self) -> Option<&str> {
        self.output_language.as_deref()
    }

    pub fn user_agent(&self) -> &ChatAgent {
        &self.user_agent
    }

    pub fn assistant_agent(&self) -> &ChatAgent {
        &self.assistant_agent
    }

    pub(crate) fn logger(&self) -> Option<&SharedLogger> {
        self.logger.as_ref()
    }

    /// Reset both agents and produce the opening message for the user agent
    pub fn init_chat(&mut self, init_prompt: Option<&str>) -> ChatMessage {
        self.user_agent.reset();
        self.assistant_agent.reset();
        let mut message = ChatMessage::assistant(init_prompt.unwrap_or(prompts::INIT_PROMPT));
        message.name = Some(self.assistant_role_name.clone());
        message
    }

    /// Run one round: the user agent reacts to `assistant_msg`, then the
    /// assistant agent carries out the resulting instruction.
    pub async fn step(&mut self, assistant_msg: &ChatMessage) -> Result<RoundResponse> {
        let user_response = self.user_agent.step(assistant_msg).await?;
        let user_msg = match user_response.msg() {
            Some(msg) if !user_response.terminated => msg.clone(),
            _ => {
                return Ok(RoundResponse {
                    assistant: AgentResponse::default(),
                    user: AgentResponse {
                        msgs: Vec::new(),
                        terminated: true,
                        info: user_response.info,
                    },
                    next_message: None,
                })
            }
        };

        let task_done = user_msg.content.contains(TASK_DONE);
        let mut instruction = user_msg.clone();
        if task_done {
            instruction.content.push_str(&prompts::final_answer_request(&self.task_prompt));
        } else {
            instruction.content.push_str(&prompts::auxiliary_info(&self.task_prompt));
        }

        let assistant_response = self.assistant_agent.step(&instruction).await?;
        let assistant_msg = match assistant_response.msg() {
            Some(msg) if !assistant_response.terminated => msg.clone(),
            _ => {
                return Ok(RoundResponse {
                    assistant: AgentResponse {
                        msgs: Vec::new(),
                        terminated: true,
                        info: assistant_response.info,
                    },
                    user: AgentResponse {
                        msgs: vec![user_msg],
                        terminated: false,
                        info: user_response.info,
                    },
                    next_message: None,
                })
            }
        };

        let mut forward = assistant_msg.clone();
        if !task_done {
            forward.content.push_str(&prompts::next_instruction_reminder(&self.task_prompt));
        }

        Ok(RoundResponse {
            assistant: AgentResponse {
                msgs: vec![assistant_msg],
                terminated: false,
                info: assistant_response.info,
            },
            user: AgentResponse {
                msgs: vec![user_msg],
                terminated: false,
                info: user_response.info,
            },
            next_message: Some(forward),
        })
    }
}
