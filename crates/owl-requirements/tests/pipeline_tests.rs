use std::sync::Arc;
use std::time::Duration;

use owl_llm_api::mock::ScriptedLlmClient;
use owl_llm_api::{ChatMessage, LlmClient, LlmResponse, ToolDefinition};
use owl_requirements::{
    AgentCoordinator, Priority, PromptTemplates, QualityChecker, Requirement, RequirementsError, RequirementsExtractor,
    WorkflowOutcome,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn extraction_reply(clarification: Option<&str>, complete: bool) -> String {
    let body = json!({
        "requirements": [{
            "id": "REQ-001",
            "title": "User login",
            "description": "Users log in with username and password",
            "priority": "high",
            "type": "functional"
        }],
        "clarification_needed": clarification,
        "requirements_complete": complete
    });
    format!("Here is the extraction:\n```json\n{}\n```", body)
}

fn analysis_reply() -> String {
    json!({
        "functional_analysis": {"core_features": ["login"]},
        "non_functional_analysis": {},
        "dependencies": [],
        "risks": ["password reuse"],
        "recommendations": []
    })
    .to_string()
}

fn quality_reply() -> String {
    json!({
        "quality_score": {
            "requirements_quality": {"score": 80, "details": []},
            "analysis_quality": {"score": 75, "details": []}
        },
        "issues": [],
        "suggestions": ["Add a lockout policy"]
    })
    .to_string()
}

fn documentation_reply() -> String {
    json!({
        "documentation": {
            "project_overview": {"title": "Login Service", "version": "1.0.0"},
            "executive_summary": {"background": "Users need accounts"},
            "requirements_specification": {"functional_requirements": []},
            "analysis_results": {},
            "quality_assessment": {"overall_score": 78},
            "implementation_plan": {"phases": []}
        }
    })
    .to_string()
}

fn coordinator(client: &Arc<ScriptedLlmClient>) -> AgentCoordinator {
    let dyn_client: Arc<dyn LlmClient> = client.clone();
    AgentCoordinator::from_clients(dyn_client.clone(), dyn_client, &PromptTemplates::default(), 2)
}

#[tokio::test]
async fn test_full_workflow_without_clarification() {
    let client = Arc::new(ScriptedLlmClient::new());
    client
        .push_text(extraction_reply(None, true))
        .push_text(analysis_reply())
        .push_text(quality_reply())
        .push_text(documentation_reply());

    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(&client).with_output_dir(dir.path());
    let session = coordinator.create_session().await;

    let outcome = coordinator
        .process_input(&session, "A web service where users log in")
        .await
        .unwrap();

    match &outcome {
        WorkflowOutcome::Complete {
            requirements,
            analysis,
            quality,
            documentation,
            saved_to,
            ..
        } => {
            assert_eq!(requirements.len(), 1);
            assert_eq!(requirements[0].priority, Priority::High);
            assert_eq!(analysis["risks"][0], "password reuse");
            assert_eq!(quality.requirements_quality.score, 80.0);
            assert_eq!(
                documentation["documentation"]["project_overview"]["title"],
                "Login Service"
            );
            let saved_to = saved_to.as_ref().unwrap();
            assert!(saved_to.exists());
            assert!(saved_to.with_extension("md").exists());
        }
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(outcome.session_id(), session);

    let context = coordinator.get_session(&session).await.unwrap();
    assert!(context.is_complete);
    assert!(context.current_analysis.is_some());
    assert_eq!(context.conversation_history[0].role, "user");

    let metrics = coordinator.metrics().await;
    assert_eq!(metrics.total_workflows, 1);
    assert_eq!(metrics.successful_workflows, 1);
    assert_eq!(client.remaining(), 0);
}

#[tokio::test]
async fn test_clarification_round_trip() {
    let client = Arc::new(ScriptedLlmClient::new());
    client
        .push_text(extraction_reply(Some("Should third-party login be supported?"), false))
        .push_text(extraction_reply(None, true))
        .push_text(analysis_reply())
        .push_text(quality_reply())
        .push_text(documentation_reply());

    let coordinator = coordinator(&client);
    let session = coordinator.create_session().await;

    let first = coordinator.process_input(&session, "Users need to log in").await.unwrap();
    match &first {
        WorkflowOutcome::NeedsClarification { clarification, requirements, .. } => {
            assert_eq!(clarification.question, "Should third-party login be supported?");
            assert_eq!(requirements.len(), 1);
        }
        other => panic!("expected clarification, got {:?}", other),
    }
    let context = coordinator.get_session(&session).await.unwrap();
    assert!(context.needs_clarification);
    assert_eq!(coordinator.metrics().await.total_workflows, 0);

    let second = coordinator.process_input(&session, "Google login only").await.unwrap();
    assert!(second.is_complete());

    let context = coordinator.get_session(&session).await.unwrap();
    assert!(!context.needs_clarification);
    assert_eq!(context.clarifications.len(), 1);
    assert_eq!(context.clarifications[0].question, "Should third-party login be supported?");
    assert_eq!(context.clarifications[0].answer, "Google login only");
    // Same id on the second extraction replaces rather than duplicates
    assert_eq!(context.requirements.len(), 1);

    let calls = client.calls();
    let second_prompt = &calls[1].messages[0].content;
    assert!(second_prompt.contains("Q: Should third-party login be supported?\nA: Google login only"));
    assert!(second_prompt.contains("[REQ-001] User login"));
}

#[tokio::test]
async fn test_extraction_retries_then_succeeds() {
    let client = Arc::new(ScriptedLlmClient::new());
    client
        .push_text("I could not produce JSON, sorry.")
        .push_text(extraction_reply(None, true));

    let extractor = RequirementsExtractor::new(client.clone(), PromptTemplates::default().extraction, 3);
    let result = extractor.extract("Users log in", None).await.unwrap();
    assert_eq!(result.requirements[0].id, "REQ-001");
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn test_extraction_gives_up_after_max_retries() {
    let client = Arc::new(ScriptedLlmClient::new());
    client
        .push_text(r#"{"requirements": [{"id": "REQ-001"}]}"#)
        .push_error("rate limited");

    let extractor = RequirementsExtractor::new(client.clone(), PromptTemplates::default().extraction, 2);
    let err = extractor.extract("Users log in", None).await.unwrap_err();
    match err {
        RequirementsError::RetriesExhausted { stage, attempts, last_error } => {
            assert_eq!(stage, "extraction");
            assert_eq!(attempts, 2);
            assert!(last_error.contains("rate limited"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_workflow_counts_in_metrics() {
    let client = Arc::new(ScriptedLlmClient::new());
    client
        .push_text(extraction_reply(None, true))
        .push_text("not json")
        .push_text("[1, 2, 3]");

    let coordinator = coordinator(&client);
    let session = coordinator.create_session().await;
    let err = coordinator.process_input(&session, "Users log in").await.unwrap_err();
    assert!(matches!(err, RequirementsError::RetriesExhausted { stage: "analysis", .. }));

    let metrics = coordinator.metrics().await;
    assert_eq!(metrics.failed_workflows, 1);
    assert_eq!(metrics.success_rate, 0.0);

    // Requirements extracted before the failure stay in the session
    let context = coordinator.get_session(&session).await.unwrap();
    assert_eq!(context.requirements.len(), 1);
    assert!(!context.is_complete);
}

#[tokio::test]
async fn test_quality_check_requires_analysis() {
    let client = Arc::new(ScriptedLlmClient::new());
    let checker = QualityChecker::new(client.clone(), PromptTemplates::default().quality, 1);
    let requirements: Vec<Requirement> = vec![serde_json::from_value(json!({
        "id": "REQ-001", "title": "t", "description": "d", "priority": "low", "type": "functional"
    }))
    .unwrap()];

    let err = checker.check(&requirements, &json!({}), None).await.unwrap_err();
    assert!(matches!(err, RequirementsError::MissingInput("analysis")));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_reported() {
    let client = Arc::new(ScriptedLlmClient::new());
    let coordinator = coordinator(&client);
    let err = coordinator.require_session("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "unknown session 'missing'");
}

/// Scripted replies, each delivered after a pause
struct DelayedClient {
    inner: ScriptedLlmClient,
    delay: Duration,
}

#[async_trait::async_trait]
impl LlmClient for DelayedClient {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> anyhow::Result<LlmResponse> {
        tokio::time::sleep(self.delay).await;
        self.inner.chat(messages, tools).await
    }
}

#[tokio::test]
async fn test_concurrent_inputs_to_one_session_are_serialized() {
    let inner = ScriptedLlmClient::new();
    inner
        .push_text(extraction_reply(Some("Which platforms?"), false))
        .push_text(extraction_reply(Some("Any SSO provider?"), false));
    let client: Arc<dyn LlmClient> = Arc::new(DelayedClient {
        inner,
        delay: Duration::from_millis(50),
    });
    let coordinator = AgentCoordinator::from_clients(client.clone(), client, &PromptTemplates::default(), 1);
    let session = coordinator.create_session().await;

    let (first, second) = tokio::join!(
        coordinator.process_input(&session, "first"),
        coordinator.process_input(&session, "second")
    );
    assert!(first.unwrap().needs_clarification());
    assert!(second.unwrap().needs_clarification());

    let context = coordinator.get_session(&session).await.unwrap();
    assert_eq!(context.conversation_history.len(), 4);
    assert_eq!(context.clarifications.len(), 1);
    assert_eq!(context.requirements.len(), 1);
}
