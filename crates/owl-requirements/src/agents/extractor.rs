use std::sync::Arc;

use owl_llm_api::LlmClient;
use owl_logging::safe_truncate;
use serde_json::Value;

use super::{complete, exhausted};
use crate::context::DialogueContext;
use crate::error::{RequirementsError, Result};
use crate::json_utils::extract_json;
use crate::models::ExtractionResult;
use crate::templates::render;

const REQUIRED_FIELDS: [&str; 5] = ["id", "title", "description", "priority", "type"];

/// Check the shape of an extraction reply and convert it
pub fn validate_extraction(value: Value) -> Result<ExtractionResult> {
    let invalid = |message: String| RequirementsError::InvalidResult {
        stage: "extraction",
        message,
    };

    let requirements = value
        .get("requirements")
        .ok_or_else(|| invalid("missing 'requirements'".to_string()))?
        .as_array()
        .ok_or_else(|| invalid("'requirements' is not a list".to_string()))?;

    for (i, req) in requirements.iter().enumerate() {
        let obj = req
            .as_object()
            .ok_or_else(|| invalid(format!("requirement {} is not an object", i)))?;
        if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !obj.contains_key(**f)) {
            return Err(invalid(format!("requirement {} is missing '{}'", i, field)));
        }
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Turns free text into a structured requirement list
pub struct RequirementsExtractor {
    client: Arc<dyn LlmClient>,
    template: String,
    max_retries: u32,
}

impl RequirementsExtractor {
    pub fn new(client: Arc<dyn LlmClient>, template: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client,
            template: template.into(),
            max_retries: max_retries.max(1),
        }
    }

    pub fn prompt(&self, text: &str, context: Option<&DialogueContext>) -> String {
        let context_info = context.map(|c| c.extraction_info()).unwrap_or_default();
        render(&self.template, &[("input", text), ("context", &context_info)])
    }

    pub async fn extract(&self, text: &str, context: Option<&DialogueContext>) -> Result<ExtractionResult> {
        log::info!("extracting requirements from: {}", safe_truncate(text, 200));
        let prompt = self.prompt(text, context);

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            let result = match complete(self.client.as_ref(), &prompt).await {
                Ok(reply) => extract_json(&reply).and_then(validate_extraction),
                Err(e) => Err(e),
            };
            match result {
                Ok(extraction) => {
                    log::info!("extracted {} requirements", extraction.requirements.len());
                    return Ok(extraction);
                }
                Err(e) => {
                    log::warn!("extraction attempt {}/{} failed: {}", attempt, self.max_retries, e);
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted("extraction", self.max_retries, last_error))
    }
}
