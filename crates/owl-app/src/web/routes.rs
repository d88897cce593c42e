use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use owl_agents::{run_society, SocietyResult};
use owl_llm_api::LlmClient;
use owl_requirements::{AgentCoordinator, DialogueContext, RequirementsError, WorkflowMetrics, WorkflowOutcome};
use owl_toolcore::ToolRegistry;
use serde::Deserialize;
use std::sync::Arc;

use crate::app::setup::{build_society, Roles};
use crate::config::OwlConfig;

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OwlConfig>,
    pub user_client: Arc<dyn LlmClient>,
    pub assistant_client: Arc<dyn LlmClient>,
    pub registry: Option<Arc<ToolRegistry>>,
    pub coordinator: Arc<AgentCoordinator>,
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/run", post(run_task))
        .route("/api/requirements/sessions", get(list_sessions).post(create_session))
        .route("/api/requirements/sessions/:id", get(get_session))
        .route("/api/requirements/sessions/:id/input", post(session_input))
        .route("/api/requirements/metrics", get(metrics))
        .route("/", get(serve_index))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub task: String,
    #[serde(default)]
    pub round_limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub text: String,
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.config.model,
        "tools": state.registry.as_ref().map(|r| r.len()).unwrap_or(0),
    }))
}

/// POST /api/run - Run one role-playing task to completion
async fn run_task(
    State(state): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<SocietyResult>, AppError> {
    let task = payload.task.trim();
    if task.is_empty() {
        return Err(AppError::BadRequest("task must not be empty".into()));
    }
    // Requests may lower the configured limit, never raise it
    let round_limit = match payload.round_limit {
        Some(0) => return Err(AppError::BadRequest("round_limit must be at least 1".into())),
        Some(limit) => limit.min(state.config.round_limit),
        None => state.config.round_limit,
    };

    let mut society = build_society(
        &state.config,
        task,
        (state.user_client.clone(), state.assistant_client.clone()),
        state.registry.clone(),
        Roles::default(),
        None,
    )?;
    let result = run_society(&mut society, round_limit).await?;
    Ok(Json(result))
}

/// GET /api/requirements/sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.coordinator.session_ids().await;
    Json(serde_json::json!({ "sessions": sessions }))
}

/// POST /api/requirements/sessions - Start a requirements dialogue
async fn create_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    let session_id = state.coordinator.create_session().await;
    Json(serde_json::json!({
        "session_id": session_id,
        "created_at": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/requirements/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DialogueContext>, AppError> {
    Ok(Json(state.coordinator.require_session(&id).await?))
}

/// POST /api/requirements/sessions/:id/input - Feed one message into a dialogue
async fn session_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<InputRequest>,
) -> Result<Json<WorkflowOutcome>, AppError> {
    state.coordinator.require_session(&id).await?;
    if payload.text.trim().is_empty() {
        return Err(AppError::BadRequest("text must not be empty".into()));
    }
    Ok(Json(state.coordinator.process_input(&id, &payload.text).await?))
}

/// GET /api/requirements/metrics
async fn metrics(State(state): State<AppState>) -> Json<WorkflowMetrics> {
    Json(state.coordinator.metrics().await)
}

/// GET / - Serve main page
async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../../web/index.html"))
}

/// Error type for handlers
#[derive(Debug)]
pub enum AppError {
    Anyhow(anyhow::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

impl From<RequirementsError> for AppError {
    fn from(err: RequirementsError) -> Self {
        match err {
            RequirementsError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            other => AppError::Anyhow(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Anyhow(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
