use std::sync::Arc;

use owl_llm_api::LlmClient;
use serde_json::Value;

use super::{complete, exhausted, requirements_json};
use crate::context::DialogueContext;
use crate::error::{RequirementsError, Result};
use crate::json_utils::{extract_json, strip_code_fence};
use crate::models::Requirement;
use crate::templates::render;

/// Produces a free-form JSON analysis of a requirement list
pub struct RequirementsAnalyzer {
    client: Arc<dyn LlmClient>,
    template: String,
    max_retries: u32,
}

impl RequirementsAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>, template: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client,
            template: template.into(),
            max_retries: max_retries.max(1),
        }
    }

    pub fn prompt(&self, requirements: &[Requirement], context: Option<&DialogueContext>) -> String {
        let context_info = context.map(|c| c.analysis_info()).unwrap_or_default();
        render(
            &self.template,
            &[
                ("requirements", &requirements_json(requirements)),
                ("context_info", &context_info),
            ],
        )
    }

    fn parse(reply: &str) -> Result<Value> {
        let body = strip_code_fence(reply);
        let value = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(_) => extract_json(reply)?,
        };
        if !value.is_object() {
            return Err(RequirementsError::InvalidResult {
                stage: "analysis",
                message: "expected a JSON object".to_string(),
            });
        }
        Ok(value)
    }

    pub async fn analyze(&self, requirements: &[Requirement], context: Option<&DialogueContext>) -> Result<Value> {
        if requirements.is_empty() {
            return Err(RequirementsError::MissingInput("requirements"));
        }
        log::info!("analyzing {} requirements", requirements.len());
        let prompt = self.prompt(requirements, context);

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            let result = match complete(self.client.as_ref(), &prompt).await {
                Ok(reply) => Self::parse(&reply),
                Err(e) => Err(e),
            };
            match result {
                Ok(analysis) => return Ok(analysis),
                Err(e) => {
                    log::warn!("analysis attempt {}/{} failed: {}", attempt, self.max_retries, e);
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted("analysis", self.max_retries, last_error))
    }
}
