use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementType {
    #[serde(rename = "functional", alias = "Functional")]
    Functional,
    #[serde(
        rename = "non_functional",
        alias = "non-functional",
        alias = "nonfunctional",
        alias = "Non-functional",
        alias = "Non-Functional"
    )]
    NonFunctional,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::Functional => "functional",
            RequirementType::NonFunctional => "non_functional",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub requirement_type: RequirementType,
}

/// A question the extractor wants answered before going further
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ClarificationRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options: None,
            context: None,
        }
    }
}

/// Models answer either with a bare question string or a full object
fn deserialize_clarification<'de, D>(deserializer: D) -> Result<Option<ClarificationRequest>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(ClarificationRequest::new(s))),
        Some(other) => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub requirements: Vec<Requirement>,
    #[serde(default, deserialize_with = "deserialize_clarification")]
    pub clarification_needed: Option<ClarificationRequest>,
    #[serde(default)]
    pub requirements_complete: bool,
}

impl ExtractionResult {
    /// True when the extractor asked a question and does not consider the requirements complete
    pub fn needs_clarification(&self) -> bool {
        self.clarification_needed.is_some() && !self.requirements_complete
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct QualityScores {
    #[serde(default)]
    requirements_quality: QualityScore,
    #[serde(default)]
    analysis_quality: QualityScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct QualityReportRepr {
    quality_score: QualityScores,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Quality verdict on the requirements and their analysis
///
/// Serialized with the scores nested under `quality_score`, the shape the
/// quality prompt asks the model for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "QualityReportRepr", into = "QualityReportRepr")]
pub struct QualityReport {
    pub requirements_quality: QualityScore,
    pub analysis_quality: QualityScore,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl From<QualityReportRepr> for QualityReport {
    fn from(repr: QualityReportRepr) -> Self {
        Self {
            requirements_quality: repr.quality_score.requirements_quality,
            analysis_quality: repr.quality_score.analysis_quality,
            issues: repr.issues,
            suggestions: repr.suggestions,
        }
    }
}

impl From<QualityReport> for QualityReportRepr {
    fn from(report: QualityReport) -> Self {
        Self {
            quality_score: QualityScores {
                requirements_quality: report.requirements_quality,
                analysis_quality: report.analysis_quality,
            },
            issues: report.issues,
            suggestions: report.suggestions,
        }
    }
}

/// A clarification question together with the user's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// The six sections every generated document must carry under `documentation`
pub const DOCUMENTATION_SECTIONS: [&str; 6] = [
    "project_overview",
    "executive_summary",
    "requirements_specification",
    "analysis_results",
    "quality_assessment",
    "implementation_plan",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_requirement_type_aliases() {
        let req: Requirement = serde_json::from_value(serde_json::json!({
            "id": "REQ-002",
            "title": "Fast login",
            "description": "Login completes within 2 seconds",
            "priority": "Medium",
            "type": "non-functional"
        }))
        .unwrap();
        assert_eq!(req.priority, Priority::Medium);
        assert_eq!(req.requirement_type, RequirementType::NonFunctional);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "non_functional");
        assert_eq!(json["priority"], "medium");
    }

    #[test]
    fn test_clarification_from_string() {
        let result: ExtractionResult = serde_json::from_value(serde_json::json!({
            "requirements": [],
            "clarification_needed": "Should third-party login be supported?",
            "requirements_complete": false
        }))
        .unwrap();
        assert_eq!(
            result.clarification_needed.as_ref().map(|c| c.question.as_str()),
            Some("Should third-party login be supported?")
        );
        assert!(result.needs_clarification());
    }

    #[test]
    fn test_clarification_absent_or_null() {
        let result: ExtractionResult =
            serde_json::from_str(r#"{"requirements": [], "clarification_needed": null}"#).unwrap();
        assert!(result.clarification_needed.is_none());
        assert!(!result.requirements_complete);

        let result: ExtractionResult = serde_json::from_str(r#"{"requirements": []}"#).unwrap();
        assert!(!result.needs_clarification());
    }

    #[test]
    fn test_quality_report_nested_shape() {
        let report: QualityReport = serde_json::from_value(serde_json::json!({
            "quality_score": {
                "requirements_quality": {"score": 85, "details": ["clear"]},
                "analysis_quality": {"score": 90.5, "details": []}
            },
            "issues": ["REQ-003 is vague"],
            "suggestions": []
        }))
        .unwrap();
        assert_eq!(report.requirements_quality.score, 85.0);
        assert_eq!(report.analysis_quality.score, 90.5);
        assert_eq!(report.issues.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["quality_score"]["requirements_quality"]["details"][0], "clear");
    }
}
