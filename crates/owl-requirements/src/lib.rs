//! Multi-turn requirements analysis.
//!
//! Free text goes through four LLM-backed stages (extraction, analysis,
//! quality check, documentation). The extractor may ask a clarification
//! question first; [`AgentCoordinator`] keeps the per-session state that
//! carries the answer into the next round.

pub mod agents;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod json_utils;
pub mod models;
pub mod templates;

pub use agents::{
    render_markdown, save_documentation, validate_documentation, validate_extraction, DocumentationGenerator,
    QualityChecker, RequirementsAnalyzer, RequirementsExtractor,
};
pub use context::DialogueContext;
pub use coordinator::{AgentCoordinator, WorkflowMetrics, WorkflowOutcome};
pub use error::{RequirementsError, Result};
pub use json_utils::extract_json;
pub use models::{
    Clarification, ClarificationRequest, ConversationEntry, ExtractionResult, Priority, QualityReport, QualityScore,
    Requirement, RequirementType, DOCUMENTATION_SECTIONS,
};
pub use templates::{PromptTemplates, TemplateKind};

/// Attempts per stage when no other value is configured
pub const DEFAULT_MAX_RETRIES: u32 = 3;
