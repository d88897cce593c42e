use std::sync::Arc;

use owl::config::OwlConfig;
use owl::web::{AppState, WebServer, WebServerConfig};
use owl_llm_api::mock::ScriptedLlmClient;
use owl_llm_api::LlmClient;
use owl_requirements::{AgentCoordinator, PromptTemplates};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

struct Harness {
    base: String,
    user: Arc<ScriptedLlmClient>,
    assistant: Arc<ScriptedLlmClient>,
    requirements: Arc<ScriptedLlmClient>,
    http: reqwest::Client,
}

async fn spawn_server() -> Harness {
    spawn_server_with(OwlConfig::default()).await
}

async fn spawn_server_with(config: OwlConfig) -> Harness {
    let user = Arc::new(ScriptedLlmClient::new());
    let assistant = Arc::new(ScriptedLlmClient::new());
    let requirements = Arc::new(ScriptedLlmClient::new());

    let req_client: Arc<dyn LlmClient> = requirements.clone();
    let coordinator = AgentCoordinator::from_clients(req_client.clone(), req_client, &PromptTemplates::default(), 1);

    let state = AppState {
        config: Arc::new(config),
        user_client: user.clone(),
        assistant_client: assistant.clone(),
        registry: None,
        coordinator: Arc::new(coordinator),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = WebServer::new(WebServerConfig { bind_addr: addr }, state).app();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Harness {
        base: format!("http://{}", addr),
        user,
        assistant,
        requirements,
        http: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_health_and_index() {
    let h = spawn_server().await;

    let health: Value = h
        .http
        .get(format!("{}/api/health", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model"], "gpt-4o");

    let index = h.http.get(&h.base).send().await.unwrap();
    assert!(index.status().is_success());
    assert!(index.text().await.unwrap().contains("/api/run"));
}

#[tokio::test]
async fn test_run_task() {
    let h = spawn_server().await;
    h.user.push_text_with_usage("Instruction: name the capital of France\nInput: None", 30, 8);
    h.user.push_text("<TASK_DONE>");
    h.assistant
        .push_text_with_usage("Solution: Paris\nNext request.", 50, 6)
        .push_text_with_usage("The capital of France is Paris.", 70, 9);

    let response = h
        .http
        .post(format!("{}/api/run", h.base))
        .json(&json!({"task": "What is the capital of France?", "round_limit": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["answer"], "The capital of France is Paris.");
    assert_eq!(result["chat_history"].as_array().unwrap().len(), 2);
    assert_eq!(result["token_info"]["completion_token_count"], 15);
    assert_eq!(h.user.remaining(), 0);
    assert_eq!(h.assistant.remaining(), 0);
}

#[tokio::test]
async fn test_run_rejects_empty_task() {
    let h = spawn_server().await;
    let response = h
        .http
        .post(format!("{}/api/run", h.base))
        .json(&json!({"task": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 400);
    assert!(h.user.calls().is_empty());
}

#[tokio::test]
async fn test_run_round_limit_bounds() {
    let h = spawn_server_with(OwlConfig {
        round_limit: 1,
        ..OwlConfig::default()
    })
    .await;

    let response = h
        .http
        .post(format!("{}/api/run", h.base))
        .json(&json!({"task": "Plan a trip", "round_limit": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(h.user.calls().is_empty());

    h.user
        .push_text("Instruction: pick a city\nInput: None")
        .push_text("Instruction: book a hotel\nInput: None");
    h.assistant
        .push_text("Solution: Lisbon\nNext request.")
        .push_text("Solution: booked\nNext request.");

    let result: Value = h
        .http
        .post(format!("{}/api/run", h.base))
        .json(&json!({"task": "Plan a trip", "round_limit": 50}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["chat_history"].as_array().unwrap().len(), 1);
    assert_eq!(result["answer"], "Solution: Lisbon\nNext request.");
    assert_eq!(h.user.remaining(), 1);
}

#[tokio::test]
async fn test_run_reports_model_failure() {
    let h = spawn_server().await;
    h.user.push_error("upstream unavailable");

    let response = h
        .http
        .post(format!("{}/api/run", h.base))
        .json(&json!({"task": "Summarize the news"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_requirements_session_flow() {
    let h = spawn_server().await;
    h.requirements.push_text(
        json!({
            "requirements": [{
                "id": "REQ-001",
                "title": "Create notes",
                "description": "Users can create text notes",
                "priority": "high",
                "type": "functional"
            }],
            "clarification_needed": "Should notes sync across devices?",
            "requirements_complete": false
        })
        .to_string(),
    );

    let created: Value = h
        .http
        .post(format!("{}/api/requirements/sessions", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = created["session_id"].as_str().unwrap().to_string();

    let outcome: Value = h
        .http
        .post(format!("{}/api/requirements/sessions/{}/input", h.base, session_id))
        .json(&json!({"text": "A note taking app"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["status"], "needs_clarification");
    assert_eq!(outcome["session_id"], session_id.as_str());
    assert_eq!(outcome["clarification"]["question"], "Should notes sync across devices?");

    let context: Value = h
        .http
        .get(format!("{}/api/requirements/sessions/{}", h.base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(context["needs_clarification"], true);
    assert_eq!(context["requirements"][0]["id"], "REQ-001");

    let metrics: Value = h
        .http
        .get(format!("{}/api/requirements/metrics", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["total_workflows"], 0);
}

#[tokio::test]
async fn test_unknown_requirements_session() {
    let h = spawn_server().await;

    let response = h
        .http
        .get(format!("{}/api/requirements/sessions/nope", h.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = h
        .http
        .post(format!("{}/api/requirements/sessions/nope/input", h.base))
        .json(&json!({"text": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(h.requirements.calls().is_empty());
}
