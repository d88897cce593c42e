use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use owl_llm_api::LlmClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::agents::{DocumentationGenerator, QualityChecker, RequirementsAnalyzer, RequirementsExtractor};
use crate::context::DialogueContext;
use crate::error::{RequirementsError, Result};
use crate::models::{ClarificationRequest, QualityReport, Requirement};
use crate::templates::PromptTemplates;

/// Result of feeding one user input into a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// The extractor needs an answer before analysis can start
    NeedsClarification {
        session_id: String,
        clarification: ClarificationRequest,
        requirements: Vec<Requirement>,
    },
    Complete {
        session_id: String,
        requirements: Vec<Requirement>,
        analysis: Value,
        quality: QualityReport,
        documentation: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        saved_to: Option<PathBuf>,
    },
}

impl WorkflowOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            WorkflowOutcome::NeedsClarification { session_id, .. } | WorkflowOutcome::Complete { session_id, .. } => {
                session_id
            }
        }
    }

    pub fn needs_clarification(&self) -> bool {
        matches!(self, WorkflowOutcome::NeedsClarification { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, WorkflowOutcome::Complete { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetrics {
    pub total_workflows: u64,
    pub successful_workflows: u64,
    pub failed_workflows: u64,
    pub success_rate: f64,
    /// Seconds
    pub average_workflow_time: f64,
}

impl WorkflowMetrics {
    fn record(&mut self, successful: bool, seconds: f64) {
        self.total_workflows += 1;
        if successful {
            self.successful_workflows += 1;
        } else {
            self.failed_workflows += 1;
        }
        let n = self.total_workflows as f64;
        self.average_workflow_time = (self.average_workflow_time * (n - 1.0) + seconds) / n;
        self.success_rate = self.successful_workflows as f64 / n;
    }
}

/// Runs extract, analyze, check and document over multi-turn sessions
pub struct AgentCoordinator {
    extractor: RequirementsExtractor,
    analyzer: RequirementsAnalyzer,
    checker: QualityChecker,
    generator: DocumentationGenerator,
    /// Each session is locked for the whole of one `process_input`
    sessions: RwLock<HashMap<String, Arc<Mutex<DialogueContext>>>>,
    metrics: RwLock<WorkflowMetrics>,
    output_dir: Option<PathBuf>,
}

impl AgentCoordinator {
    pub fn new(
        extractor: RequirementsExtractor,
        analyzer: RequirementsAnalyzer,
        checker: QualityChecker,
        generator: DocumentationGenerator,
    ) -> Self {
        Self {
            extractor,
            analyzer,
            checker,
            generator,
            sessions: RwLock::new(HashMap::new()),
            metrics: RwLock::new(WorkflowMetrics::default()),
            output_dir: None,
        }
    }

    /// Build all four stages from one client, plus a dedicated client for the quality check
    pub fn from_clients(
        client: Arc<dyn LlmClient>,
        quality_client: Arc<dyn LlmClient>,
        templates: &PromptTemplates,
        max_retries: u32,
    ) -> Self {
        Self::new(
            RequirementsExtractor::new(client.clone(), templates.extraction.clone(), max_retries),
            RequirementsAnalyzer::new(client.clone(), templates.analysis.clone(), max_retries),
            QualityChecker::new(quality_client, templates.quality.clone(), max_retries),
            DocumentationGenerator::new(client, templates.documentation.clone(), max_retries),
        )
    }

    /// Save every finished document under `dir` as well as returning it
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub async fn create_session(&self) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(DialogueContext::new())));
        log::info!("created requirements session {}", session_id);
        session_id
    }

    /// Snapshot of a session; waits for an in-flight `process_input` on it to finish
    pub async fn get_session(&self, session_id: &str) -> Option<DialogueContext> {
        let slot = self.sessions.read().await.get(session_id).cloned()?;
        let context = slot.lock().await.clone();
        Some(context)
    }

    async fn session_slot(&self, session_id: &str) -> Arc<Mutex<DialogueContext>> {
        let existing = self.sessions.read().await.get(session_id).cloned();
        if let Some(slot) = existing {
            return slot;
        }
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    pub async fn require_session(&self, session_id: &str) -> Result<DialogueContext> {
        self.get_session(session_id)
            .await
            .ok_or_else(|| RequirementsError::SessionNotFound(session_id.to_string()))
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn metrics(&self) -> WorkflowMetrics {
        *self.metrics.read().await
    }

    /// Feed one user message into `session_id`, creating the session if needed.
    ///
    /// If the session is waiting on a clarification, `text` is recorded as the
    /// answer before extraction runs again. Inputs to the same session are
    /// processed one at a time.
    pub async fn process_input(&self, session_id: &str, text: &str) -> Result<WorkflowOutcome> {
        let slot = self.session_slot(session_id).await;
        let mut context = slot.lock().await;

        context.add_conversation_entry("user", text);
        if context.needs_clarification {
            let question = context
                .current_clarification
                .as_ref()
                .map(|c| c.question.clone())
                .unwrap_or_default();
            context.add_clarification(question, text);
            context.clear_clarification_state();
        }

        let started = Instant::now();
        let outcome = self.run(session_id, text, &mut context).await;
        drop(context);

        match &outcome {
            Ok(WorkflowOutcome::NeedsClarification { .. }) => {}
            Ok(WorkflowOutcome::Complete { .. }) => {
                self.metrics.write().await.record(true, started.elapsed().as_secs_f64());
            }
            Err(e) => {
                log::error!("requirements workflow failed for session {}: {}", session_id, e);
                self.metrics.write().await.record(false, started.elapsed().as_secs_f64());
            }
        }

        outcome
    }

    async fn run(&self, session_id: &str, text: &str, context: &mut DialogueContext) -> Result<WorkflowOutcome> {
        let extraction = self.extractor.extract(text, Some(&*context)).await?;
        let needs_clarification = extraction.needs_clarification();
        for requirement in extraction.requirements {
            context.upsert_requirement(requirement);
        }

        if needs_clarification {
            if let Some(clarification) = extraction.clarification_needed {
                context.add_conversation_entry("assistant", clarification.question.clone());
                context.set_needs_clarification(clarification.clone());
                return Ok(WorkflowOutcome::NeedsClarification {
                    session_id: session_id.to_string(),
                    clarification,
                    requirements: context.requirements.clone(),
                });
            }
        }

        if context.requirements.is_empty() {
            return Err(RequirementsError::MissingInput("requirements"));
        }

        let analysis = self.analyzer.analyze(&context.requirements, Some(&*context)).await?;
        context.current_analysis = Some(analysis.clone());

        let quality = self.checker.check(&context.requirements, &analysis, Some(&*context)).await?;
        let documentation = self
            .generator
            .generate(&context.requirements, &analysis, &quality, Some(&*context))
            .await?;

        let saved_to = match &self.output_dir {
            Some(dir) => {
                let (json_path, _) = self.generator.save(&documentation, &dir.join("requirements_document"))?;
                Some(json_path)
            }
            None => None,
        };

        context.is_complete = true;
        context.add_conversation_entry("assistant", "Requirements document generated");

        Ok(WorkflowOutcome::Complete {
            session_id: session_id.to_string(),
            requirements: context.requirements.clone(),
            analysis,
            quality,
            documentation,
            saved_to,
        })
    }
}
