use std::path::Path;

use serde::Deserialize;

use crate::error::{RequirementsError, Result};

const EXTRACTION_TEMPLATE: &str = r#"You are a professional requirements analyst. Analyze the input below and extract the key requirements. If anything needs clarification, ask one specific question.

User input:
{input}

{context}

Return the result as JSON with these fields:
1. requirements: list of extracted requirements, each with
   - id: requirement ID (e.g. REQ-001)
   - title: requirement title
   - description: requirement description
   - priority: high, medium or low
   - type: functional or non_functional
2. clarification_needed: a specific question if clarification is needed, otherwise null
3. requirements_complete: boolean, whether the requirements are complete

Example output:
{
    "requirements": [
        {
            "id": "REQ-001",
            "title": "User login",
            "description": "The system must let users log in with a username and password",
            "priority": "high",
            "type": "functional"
        }
    ],
    "clarification_needed": "Should the system support third-party login?",
    "requirements_complete": false
}"#;

const ANALYSIS_TEMPLATE: &str = r#"Analyze the following requirements and provide a detailed analysis.

Requirements:
{requirements}

{context_info}

Return the analysis as JSON with these fields:
1. functional_analysis: analysis of the functional requirements
2. non_functional_analysis: analysis of the non-functional requirements
3. dependencies: dependencies between requirements
4. risks: risk assessment
5. recommendations: recommendations

Example output:
{
    "functional_analysis": {
        "core_features": [],
        "optional_features": [],
        "user_interfaces": []
    },
    "non_functional_analysis": {
        "performance": {},
        "security": {},
        "scalability": {}
    },
    "dependencies": [],
    "risks": [],
    "recommendations": []
}"#;

const QUALITY_TEMPLATE: &str = r#"Check the quality of the following requirements and their analysis.

Requirements:
{requirements}

Analysis:
{analysis}

{context_info}

Return the quality check as JSON with these fields:
1. quality_score:
   - requirements_quality: score (0-100) and details for the requirements
   - analysis_quality: score (0-100) and details for the analysis
2. issues: problems found, as strings
3. suggestions: improvement suggestions, as strings

Example output:
{
    "quality_score": {
        "requirements_quality": {
            "score": 85,
            "details": []
        },
        "analysis_quality": {
            "score": 90,
            "details": []
        }
    },
    "issues": [],
    "suggestions": []
}"#;

const DOCUMENTATION_TEMPLATE: &str = r#"Produce a complete requirements document from the information below.

Requirements:
{requirements}

Analysis:
{analysis}

Quality check:
{quality_check}

{context_info}

Return the document as JSON with a "documentation" object holding these sections:
1. project_overview: title, version, date, status, authors, reviewers, approvers
2. executive_summary: background, objectives, scope (in_scope, out_of_scope), stakeholders
3. requirements_specification: functional_requirements and non_functional_requirements, each item with id, title, description, priority, status, acceptance_criteria
4. analysis_results: feasibility (per area: score, summary, challenges, recommendations)
5. quality_assessment: overall_score, summary, metrics (per metric: score, findings, recommendations)
6. implementation_plan: phases (name, duration, deliverables, milestones)

Example output:
{
    "documentation": {
        "project_overview": {
            "title": "Project name",
            "version": "1.0.0",
            "date": "2024-03-21",
            "status": "Draft",
            "authors": ["Requirements analyst"],
            "reviewers": ["Quality checker"],
            "approvers": ["Project manager"]
        },
        "executive_summary": {
            "background": "Project background...",
            "objectives": ["Objective 1", "Objective 2"],
            "scope": {
                "in_scope": ["Scope 1"],
                "out_of_scope": ["Exclusion 1"]
            },
            "stakeholders": ["Stakeholder 1"]
        },
        "requirements_specification": {},
        "analysis_results": {},
        "quality_assessment": {},
        "implementation_plan": {}
    }
}"#;

/// The prompt each pipeline stage sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    RequirementsExtraction,
    RequirementsAnalysis,
    QualityCheck,
    Documentation,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::RequirementsExtraction,
        TemplateKind::RequirementsAnalysis,
        TemplateKind::QualityCheck,
        TemplateKind::Documentation,
    ];

    /// File stem looked up in the templates directory
    pub fn file_stem(&self) -> &'static str {
        match self {
            TemplateKind::RequirementsExtraction => "requirements_extraction",
            TemplateKind::RequirementsAnalysis => "requirements_analysis",
            TemplateKind::QualityCheck => "quality_checker",
            TemplateKind::Documentation => "documentation_generator",
        }
    }

    pub fn default_template(&self) -> &'static str {
        match self {
            TemplateKind::RequirementsExtraction => EXTRACTION_TEMPLATE,
            TemplateKind::RequirementsAnalysis => ANALYSIS_TEMPLATE,
            TemplateKind::QualityCheck => QUALITY_TEMPLATE,
            TemplateKind::Documentation => DOCUMENTATION_TEMPLATE,
        }
    }
}

#[derive(Deserialize)]
struct TemplateFile {
    template: String,
}

/// Prompt templates for the four pipeline stages
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplates {
    pub extraction: String,
    pub analysis: String,
    pub quality: String,
    pub documentation: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            extraction: EXTRACTION_TEMPLATE.to_string(),
            analysis: ANALYSIS_TEMPLATE.to_string(),
            quality: QUALITY_TEMPLATE.to_string(),
            documentation: DOCUMENTATION_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Built-in templates, each replaced by `<dir>/<stem>.json` when that file exists
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut templates = Self::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        for kind in TemplateKind::ALL {
            let path = dir.join(format!("{}.json", kind.file_stem()));
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(&path)?;
            let file: TemplateFile = serde_json::from_str(&text).map_err(|e| RequirementsError::Template {
                name: kind.file_stem().to_string(),
                message: e.to_string(),
            })?;
            log::info!("loaded {} template from {}", kind.file_stem(), path.display());
            *templates.get_mut(kind) = file.template;
        }
        Ok(templates)
    }

    pub fn get(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::RequirementsExtraction => &self.extraction,
            TemplateKind::RequirementsAnalysis => &self.analysis,
            TemplateKind::QualityCheck => &self.quality,
            TemplateKind::Documentation => &self.documentation,
        }
    }

    fn get_mut(&mut self, kind: TemplateKind) -> &mut String {
        match kind {
            TemplateKind::RequirementsExtraction => &mut self.extraction,
            TemplateKind::RequirementsAnalysis => &mut self.analysis,
            TemplateKind::QualityCheck => &mut self.quality,
            TemplateKind::Documentation => &mut self.documentation,
        }
    }
}

/// Substitute `{name}` placeholders; other braces are left alone
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
