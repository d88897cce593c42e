use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Clarification, ClarificationRequest, ConversationEntry, Requirement};

/// State of one requirements dialogue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueContext {
    pub requirements: Vec<Requirement>,
    pub clarifications: Vec<Clarification>,
    pub current_analysis: Option<Value>,
    pub conversation_history: Vec<ConversationEntry>,
    pub needs_clarification: bool,
    pub current_clarification: Option<ClarificationRequest>,
    pub is_complete: bool,
}

impl DialogueContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `requirement`, replacing an earlier one with the same id
    pub fn upsert_requirement(&mut self, requirement: Requirement) {
        match self.requirements.iter_mut().find(|r| r.id == requirement.id) {
            Some(existing) => *existing = requirement,
            None => self.requirements.push(requirement),
        }
    }

    pub fn add_clarification(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.clarifications.push(Clarification {
            question: question.into(),
            answer: answer.into(),
            timestamp: Local::now().to_rfc3339(),
        });
    }

    pub fn add_conversation_entry(&mut self, role: &str, content: impl Into<String>) {
        self.conversation_history.push(ConversationEntry {
            role: role.to_string(),
            content: content.into(),
            timestamp: Local::now().to_rfc3339(),
        });
    }

    pub fn set_needs_clarification(&mut self, request: ClarificationRequest) {
        self.needs_clarification = true;
        self.current_clarification = Some(request);
    }

    pub fn clear_clarification_state(&mut self) {
        self.needs_clarification = false;
        self.current_clarification = None;
    }

    /// Context block for the extraction prompt: known requirements and past clarifications
    pub fn extraction_info(&self) -> String {
        let mut info = String::from("\nCurrent context:\n");
        if !self.requirements.is_empty() {
            info.push_str("Requirements collected so far:\n");
            for req in &self.requirements {
                info.push_str(&format!("- [{}] {}: {}\n", req.id, req.title, req.description));
            }
        }
        self.push_clarifications(&mut info, "\nPrevious clarifications:\n");
        info
    }

    /// Context block for the later stages: clarifications and the current analysis
    pub fn analysis_info(&self) -> String {
        let mut info = String::from("\nCurrent context:\n");
        self.push_clarifications(&mut info, "Clarification history:\n");
        if let Some(analysis) = &self.current_analysis {
            info.push_str("\nCurrent analysis:\n");
            info.push_str(&serde_json::to_string_pretty(analysis).unwrap_or_default());
        }
        info
    }

    fn push_clarifications(&self, info: &mut String, heading: &str) {
        if self.clarifications.is_empty() {
            return;
        }
        info.push_str(heading);
        for c in &self.clarifications {
            info.push_str(&format!("Q: {}\nA: {}\n", c.question, c.answer));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, RequirementType};

    fn req(id: &str, title: &str) -> Requirement {
        Requirement {
            id: id.to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            priority: Priority::High,
            requirement_type: RequirementType::Functional,
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut ctx = DialogueContext::new();
        ctx.upsert_requirement(req("REQ-001", "Login"));
        ctx.upsert_requirement(req("REQ-002", "Logout"));
        ctx.upsert_requirement(req("REQ-001", "Login with SSO"));
        assert_eq!(ctx.requirements.len(), 2);
        assert_eq!(ctx.requirements[0].title, "Login with SSO");
    }

    #[test]
    fn test_extraction_info_lists_requirements_and_clarifications() {
        let mut ctx = DialogueContext::new();
        ctx.upsert_requirement(req("REQ-001", "Login"));
        ctx.add_clarification("Support SSO?", "Yes, Google only");
        let info = ctx.extraction_info();
        assert!(info.contains("- [REQ-001] Login: Login description"));
        assert!(info.contains("Q: Support SSO?\nA: Yes, Google only"));
    }

    #[test]
    fn test_clarification_state() {
        let mut ctx = DialogueContext::new();
        ctx.set_needs_clarification(ClarificationRequest::new("Which platforms?"));
        assert!(ctx.needs_clarification);
        ctx.clear_clarification_state();
        assert!(!ctx.needs_clarification);
        assert!(ctx.current_clarification.is_none());
    }
}
