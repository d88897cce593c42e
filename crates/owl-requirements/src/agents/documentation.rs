use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use owl_llm_api::LlmClient;
use serde_json::Value;

use super::{complete, exhausted, requirements_json};
use crate::context::DialogueContext;
use crate::error::{RequirementsError, Result};
use crate::json_utils::extract_json;
use crate::models::{QualityReport, Requirement, DOCUMENTATION_SECTIONS};
use crate::templates::render;

/// Check that `doc.documentation` is an object carrying every required section
pub fn validate_documentation(doc: &Value) -> Result<()> {
    let sections = doc
        .get("documentation")
        .and_then(Value::as_object)
        .ok_or_else(|| RequirementsError::InvalidResult {
            stage: "documentation",
            message: "missing 'documentation' object".to_string(),
        })?;

    let missing: Vec<&str> = DOCUMENTATION_SECTIONS
        .iter()
        .copied()
        .filter(|s| !sections.contains_key(*s))
        .collect();
    if !missing.is_empty() {
        return Err(RequirementsError::InvalidResult {
            stage: "documentation",
            message: format!("missing sections: {}", missing.join(", ")),
        });
    }
    Ok(())
}

/// Writes the final requirements document
pub struct DocumentationGenerator {
    client: Arc<dyn LlmClient>,
    template: String,
    max_retries: u32,
}

impl DocumentationGenerator {
    pub fn new(client: Arc<dyn LlmClient>, template: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client,
            template: template.into(),
            max_retries: max_retries.max(1),
        }
    }

    pub fn prompt(
        &self,
        requirements: &[Requirement],
        analysis: &Value,
        quality: &QualityReport,
        context: Option<&DialogueContext>,
    ) -> String {
        let context_info = context.map(|c| c.analysis_info()).unwrap_or_default();
        let analysis_json = serde_json::to_string_pretty(analysis).unwrap_or_default();
        let quality_json = serde_json::to_string_pretty(quality).unwrap_or_default();
        render(
            &self.template,
            &[
                ("requirements", &requirements_json(requirements)),
                ("analysis", &analysis_json),
                ("quality_check", &quality_json),
                ("context_info", &context_info),
            ],
        )
    }

    pub async fn generate(
        &self,
        requirements: &[Requirement],
        analysis: &Value,
        quality: &QualityReport,
        context: Option<&DialogueContext>,
    ) -> Result<Value> {
        if requirements.is_empty() {
            return Err(RequirementsError::MissingInput("requirements"));
        }
        let prompt = self.prompt(requirements, analysis, quality, context);

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            let result = match complete(self.client.as_ref(), &prompt).await {
                Ok(reply) => extract_json(&reply).and_then(|doc| validate_documentation(&doc).map(|_| doc)),
                Err(e) => Err(e),
            };
            match result {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    log::warn!("documentation attempt {}/{} failed: {}", attempt, self.max_retries, e);
                    last_error = Some(e);
                }
            }
        }
        Err(exhausted("documentation", self.max_retries, last_error))
    }

    pub fn save(&self, doc: &Value, path: &Path) -> Result<(PathBuf, PathBuf)> {
        save_documentation(doc, path)
    }
}

/// Write `doc` next to `path` as `<stem>.json` and `<stem>.md`
pub fn save_documentation(doc: &Value, path: &Path) -> Result<(PathBuf, PathBuf)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json_path = path.with_extension("json");
    let md_path = path.with_extension("md");

    std::fs::write(&json_path, serde_json::to_string_pretty(doc)?)?;
    std::fs::write(&md_path, render_markdown(doc))?;

    log::info!("documentation saved to {} and {}", json_path.display(), md_path.display());
    Ok((json_path, md_path))
}

fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn list(md: &mut Vec<String>, value: &Value, key: &str, heading: &str) {
    let Some(items) = value.get(key).and_then(Value::as_array) else {
        return;
    };
    md.push(heading.to_string());
    for item in items {
        match item {
            Value::String(s) => md.push(format!("- {}", s)),
            other => md.push(format!("- {}", other)),
        }
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn requirement_block(md: &mut Vec<String>, req: &Value) {
    md.push(format!("\n#### {}", text(req, "title")));
    md.push(format!("- ID: {}", text(req, "id")));
    md.push(format!("- Priority: {}", text(req, "priority")));
    if req.get("status").is_some() {
        md.push(format!("- Status: {}", text(req, "status")));
    }
    md.push(format!("\n{}", text(req, "description")));
    list(md, req, "acceptance_criteria", "\nAcceptance criteria:");
}

/// Render a generated document as Markdown
pub fn render_markdown(doc: &Value) -> String {
    let empty = Value::Object(Default::default());
    let doc = doc.get("documentation").unwrap_or(&empty);
    let section = |name: &str| doc.get(name).unwrap_or(&empty);
    let mut md = Vec::new();

    let overview = section("project_overview");
    let title = text(overview, "title");
    md.push(format!("# {}", if title.is_empty() { "Requirements Document" } else { title.as_str() }));
    let version = text(overview, "version");
    md.push(format!("\n**Version:** {}", if version.is_empty() { "1.0.0" } else { version.as_str() }));
    let date = text(overview, "date");
    let today = Local::now().format("%Y-%m-%d").to_string();
    md.push(format!("**Date:** {}", if date.is_empty() { today.as_str() } else { date.as_str() }));
    let status = text(overview, "status");
    md.push(format!("**Status:** {}\n", if status.is_empty() { "Draft" } else { status.as_str() }));

    let summary = section("executive_summary");
    md.push("## Executive Summary".to_string());
    md.push(format!("\n### Background\n{}", text(summary, "background")));
    list(&mut md, summary, "objectives", "\n### Objectives");
    if let Some(scope) = summary.get("scope") {
        list(&mut md, scope, "in_scope", "\n### In Scope");
        list(&mut md, scope, "out_of_scope", "\n### Out of Scope");
    }
    list(&mut md, summary, "stakeholders", "\n### Stakeholders");

    let spec = section("requirements_specification");
    md.push("\n## Requirements Specification".to_string());
    for (key, heading) in [
        ("functional_requirements", "\n### Functional Requirements"),
        ("non_functional_requirements", "\n### Non-Functional Requirements"),
    ] {
        if let Some(reqs) = spec.get(key).and_then(Value::as_array) {
            md.push(heading.to_string());
            for req in reqs {
                requirement_block(&mut md, req);
            }
        }
    }

    let analysis = section("analysis_results");
    md.push("\n## Analysis Results".to_string());
    if let Some(feasibility) = analysis.get("feasibility").and_then(Value::as_object) {
        md.push("\n### Feasibility".to_string());
        for (area, value) in feasibility {
            md.push(format!("\n#### {}", title_case(area)));
            md.push(format!("- Score: {}", text(value, "score")));
            md.push(format!("- Summary: {}", text(value, "summary")));
            list(&mut md, value, "challenges", "\nChallenges:");
            list(&mut md, value, "recommendations", "\nRecommendations:");
        }
    }

    let quality = section("quality_assessment");
    md.push("\n## Quality Assessment".to_string());
    md.push(format!("\nOverall score: {}", text(quality, "overall_score")));
    md.push(format!("\nSummary: {}", text(quality, "summary")));
    if let Some(metrics) = quality.get("metrics").and_then(Value::as_object) {
        for (metric, value) in metrics {
            md.push(format!("\n### {}", title_case(metric)));
            md.push(format!("- Score: {}", text(value, "score")));
            list(&mut md, value, "findings", "\nFindings:");
            list(&mut md, value, "recommendations", "\nRecommendations:");
        }
    }

    let plan = section("implementation_plan");
    md.push("\n## Implementation Plan".to_string());
    if let Some(phases) = plan.get("phases").and_then(Value::as_array) {
        for phase in phases {
            md.push(format!("\n### {}", text(phase, "name")));
            md.push(format!("- Duration: {}", text(phase, "duration")));
            list(&mut md, phase, "deliverables", "\nDeliverables:");
            list(&mut md, phase, "milestones", "\nMilestones:");
        }
    }

    let mut out = md.join("\n");
    out.push('\n');
    out
}
