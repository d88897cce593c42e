//! The four LLM-backed stages of the requirements pipeline.

pub mod analyzer;
pub mod documentation;
pub mod extractor;
pub mod quality;

use owl_llm_api::{ChatMessage, LlmClient};

use crate::error::{RequirementsError, Result};

pub use analyzer::RequirementsAnalyzer;
pub use documentation::{render_markdown, save_documentation, validate_documentation, DocumentationGenerator};
pub use extractor::{validate_extraction, RequirementsExtractor};
pub use quality::QualityChecker;

/// Send `prompt` as a single user message
async fn complete(client: &dyn LlmClient, prompt: &str) -> Result<String> {
    let reply = client
        .chat_completion(&[ChatMessage::user(prompt)])
        .await
        .map_err(RequirementsError::Llm)?;
    if reply.trim().is_empty() {
        return Err(RequirementsError::InvalidResult {
            stage: "llm",
            message: "empty response".to_string(),
        });
    }
    Ok(reply)
}

fn exhausted(stage: &'static str, attempts: u32, last_error: Option<RequirementsError>) -> RequirementsError {
    RequirementsError::RetriesExhausted {
        stage,
        attempts,
        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
    }
}

/// `{"requirements": [...]}` as pretty JSON, the shape every later prompt expects
fn requirements_json(requirements: &[crate::models::Requirement]) -> String {
    serde_json::to_string_pretty(&serde_json::json!({ "requirements": requirements })).unwrap_or_default()
}
