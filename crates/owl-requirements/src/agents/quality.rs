use std::sync::Arc;

use owl_llm_api::{LlmClient, ModelSettings};
use serde_json::Value;

use super::{complete, exhausted, requirements_json};
use crate::context::DialogueContext;
use crate::error::{RequirementsError, Result};
use crate::json_utils::extract_json;
use crate::models::{QualityReport, Requirement};
use crate::templates::render;

/// Scores requirements and analysis, listing issues and suggestions
pub struct QualityChecker {
    client: Arc<dyn LlmClient>,
    template: String,
    max_retries: u32,
}

impl QualityChecker {
    /// Settings the checker's client should be built with
    pub fn model_settings() -> ModelSettings {
        ModelSettings::default().with_temperature(0.1).with_max_tokens(4000)
    }

    pub fn new(client: Arc<dyn LlmClient>, template: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client,
            template: template.into(),
            max_retries: max_retries.max(1),
        }
    }

    pub fn prompt(&self, requirements: &[Requirement], analysis: &Value, context: Option<&DialogueContext>) -> String {
        let context_info = context.map(|c| c.analysis_info()).unwrap_or_default();
        let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();
        render(
            &self.template,
            &[
                ("requirements", &requirements_json(requirements)),
                ("analysis", &analysis_json),
                ("context_info", &context_info),
            ],
        )
    }

    pub async fn check(
        &self,
        requirements: &[Requirement],
        analysis: &Value,
        context: Option<&DialogueContext>,
    ) -> Result<QualityReport> {
        if requirements.is_empty() {
            return Err(RequirementsError::MissingInput("requirements"));
        }
        if analysis.is_null() || analysis.as_object().is_some_and(|o| o.is_empty()) {
            return Err(RequirementsError::MissingInput("analysis"));
        }

        let prompt = self.prompt(requirements, analysis, context);
        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            let result = match complete(self.client.as_ref(), &prompt).await {
                Ok(reply) => extract_json(&reply).and_then(|v| {
                    serde_json::from_value::<QualityReport>(v).map_err(|e| RequirementsError::InvalidResult {
                        stage: "quality check",
                        message: e.to_string(),
                    })
                }),
                Err(e) => Err(e),
            };
            match result {
                Ok(report) => {
                    log::info!(
                        "quality check: requirements {:.0}, analysis {:.0}, {} issues",
                        report.requirements_quality.score,
                        report.analysis_quality.score,
                        report.issues.len()
                    );
                    return Ok(report);
                }
                Err(e) => {
                    log::warn!("quality check attempt {}/{} failed: {}", attempt, self.max_retries, e);
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted("quality check", self.max_retries, last_error))
    }
}
