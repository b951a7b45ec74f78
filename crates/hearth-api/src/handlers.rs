//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query/body parameters via axum extractors,
//! calls into the orchestrator or the model-management client, and returns
//! JSON responses. Every chat response carries the fixed `local_only` flag:
//! all data stays on this machine and generation runs against the local
//! runtime.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hearth_core::types::MessageRecord;
use hearth_llm::LocalModel;
use hearth_storage::{MessageRepository, SessionRepository};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    /// Optional per-turn override of the session's model.
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleUpdateRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub user_message: Option<String>,
    pub assistant_response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModelParams {
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub model: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub title: String,
    pub model: String,
    pub local_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub response: String,
    pub model_used: String,
    pub context_used: bool,
    pub local_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: Uuid,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionEntry>,
    pub local_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageEntry {
    pub id: Uuid,
    pub user_message: String,
    pub assistant_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub messages: Vec<MessageEntry>,
    pub local_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitleUpdateResponse {
    pub session_id: Uuid,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    pub deleted: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditMessageResponse {
    pub message_id: Uuid,
    pub fields_updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsOverview {
    pub total_sessions: u64,
    pub total_messages: u64,
    pub recent_sessions_week: u64,
    pub retrieval_initialized: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelUsageEntry {
    pub model: String,
    pub sessions: u64,
    pub messages: u64,
    pub avg_messages_per_session: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub overview: StatsOverview,
    pub model_usage: Vec<ModelUsageEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub user_message: String,
    pub assistant_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
    pub session_id: Uuid,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub conversations: Vec<ExportedMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocalModelsResponse {
    pub models: Vec<LocalModel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveModelResponse {
    pub model: String,
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PullModelResponse {
    pub model: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub retrieval_initialized: bool,
    pub database_connected: bool,
}

fn message_entry(record: MessageRecord) -> MessageEntry {
    MessageEntry {
        id: record.id,
        user_message: record.user_message,
        assistant_response: record.assistant_response,
        created_at: record.created_at,
        modified_at: record.modified_at,
    }
}

// =============================================================================
// Chat handlers
// =============================================================================

/// POST /chat/sessions - create a new session bound to a model.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let session = state.orchestrator.create_session(&req.model)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id,
            title: session.title,
            model: session.model,
            local_only: true,
        }),
    ))
}

/// POST /chat/sessions/{id}/messages - run one turn.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Field 'message' must not be empty".to_string(),
        ));
    }

    let outcome = state
        .orchestrator
        .run_turn(session_id, &req.message, req.model.as_deref())
        .await?;

    Ok(Json(TurnResponse {
        response: outcome.assistant_text,
        model_used: outcome.model_used,
        context_used: outcome.context_used,
        local_only: true,
    }))
}

/// GET /chat/sessions - all sessions, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = state.orchestrator.list_sessions()?;
    Ok(Json(sessions_response(sessions)))
}

/// GET /chat/sessions/by_model?model=m - sessions bound to one model.
pub async fn sessions_by_model(
    State(state): State<AppState>,
    Query(params): Query<ModelParams>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let model = require_model_param(&params)?;
    let sessions = state.orchestrator.list_sessions_by_model(&model)?;
    Ok(Json(sessions_response(sessions)))
}

fn sessions_response(sessions: Vec<hearth_chat::SessionSummary>) -> SessionsResponse {
    SessionsResponse {
        sessions: sessions
            .into_iter()
            .map(|s| SessionEntry {
                session_id: s.id,
                title: s.title,
                model: s.model,
                created_at: s.created_at,
            })
            .collect(),
        local_only: true,
    }
}

/// GET /chat/sessions/stats - totals, per-model usage, recent activity.
pub async fn session_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let sessions = SessionRepository::new(Arc::clone(&state.database));
    let messages = MessageRepository::new(Arc::clone(&state.database));

    let total_sessions = sessions.count()?;
    let total_messages = messages.count()?;
    let week_ago = Utc::now() - Duration::days(7);
    let recent_sessions_week = sessions.count_created_since(week_ago)?;

    let model_usage = sessions
        .model_usage()?
        .into_iter()
        .map(|row| {
            let avg = if row.sessions > 0 {
                (row.messages as f64 / row.sessions as f64 * 10.0).round() / 10.0
            } else {
                0.0
            };
            ModelUsageEntry {
                model: row.model,
                sessions: row.sessions,
                messages: row.messages,
                avg_messages_per_session: avg,
            }
        })
        .collect();

    Ok(Json(StatsResponse {
        overview: StatsOverview {
            total_sessions,
            total_messages,
            recent_sessions_week,
            retrieval_initialized: state.retriever.is_initialized(),
        },
        model_usage,
    }))
}

/// GET /chat/sessions/{id}/history - full history, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.orchestrator.get_history(session_id)?;
    Ok(Json(HistoryResponse {
        session_id,
        messages: messages.into_iter().map(message_entry).collect(),
        local_only: true,
    }))
}

/// GET /chat/sessions/{id}/export - full session as one JSON document.
pub async fn export_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ExportResponse>, ApiError> {
    let session = state
        .orchestrator
        .get_session(session_id)?
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {}", session_id)))?;
    let history = state.orchestrator.get_history(session_id)?;

    Ok(Json(ExportResponse {
        session_id: session.id,
        title: session.title,
        model: session.model,
        created_at: session.created_at,
        conversations: history
            .into_iter()
            .map(|m| ExportedMessage {
                user_message: m.user_message,
                assistant_response: m.assistant_response,
                created_at: m.created_at,
                modified_at: m.modified_at,
            })
            .collect(),
    }))
}

/// PATCH /chat/sessions/{id}/title - rename a session.
pub async fn update_title(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<TitleUpdateRequest>,
) -> Result<Json<TitleUpdateResponse>, ApiError> {
    state.orchestrator.edit_title(session_id, &req.title)?;
    Ok(Json(TitleUpdateResponse {
        session_id,
        title: req.title.trim().to_string(),
    }))
}

/// DELETE /chat/sessions/{id} - delete a session and its messages.
///
/// Absence is reported in the body, not as an error status.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    let outcome = state.orchestrator.delete_session(session_id)?;
    Ok(Json(DeleteSessionResponse {
        deleted: outcome.deleted(),
        message: outcome.message().to_string(),
    }))
}

/// PUT /chat/messages/{id} - edit one or both fields of a stored turn.
pub async fn edit_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<EditMessageRequest>,
) -> Result<Json<EditMessageResponse>, ApiError> {
    let outcome = state.orchestrator.edit_message(
        message_id,
        req.user_message.as_deref(),
        req.assistant_response.as_deref(),
    )?;
    Ok(Json(EditMessageResponse {
        message_id: outcome.message_id,
        fields_updated: outcome.fields_updated,
    }))
}

// =============================================================================
// Model management handlers
// =============================================================================

/// GET /models/local - models installed on the runtime.
pub async fn local_models(
    State(state): State<AppState>,
) -> Result<Json<LocalModelsResponse>, ApiError> {
    let models = state.models.list_local().await?;
    Ok(Json(LocalModelsResponse { models }))
}

/// GET /models/running - models currently loaded into memory.
pub async fn running_models(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(state.models.running().await?))
}

/// GET /models/info?model=m - details for one model.
pub async fn model_info(
    State(state): State<AppState>,
    Query(params): Query<ModelParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let model = require_model_param(&params)?;
    Ok(Json(state.models.show(&model).await?))
}

/// DELETE /models/remove?model=m - remove an installed model.
pub async fn remove_model(
    State(state): State<AppState>,
    Query(params): Query<ModelParams>,
) -> Result<Json<RemoveModelResponse>, ApiError> {
    let model = require_model_param(&params)?;
    state.models.remove(&model).await?;
    Ok(Json(RemoveModelResponse {
        model,
        removed: true,
    }))
}

/// POST /models/pull - download a model; blocks until finished.
pub async fn pull_model(
    State(state): State<AppState>,
    Json(req): Json<PullRequest>,
) -> Result<Json<PullModelResponse>, ApiError> {
    let model = req.model.trim().to_string();
    if model.is_empty() {
        return Err(ApiError::BadRequest(
            "Field 'model' must not be empty".to_string(),
        ));
    }
    let status = state.models.pull(&model).await?;
    Ok(Json(PullModelResponse {
        model,
        status: status.status,
    }))
}

fn require_model_param(params: &ModelParams) -> Result<String, ApiError> {
    params
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::BadRequest("Parameter 'model' is required".to_string()))
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - service liveness and component status.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = SessionRepository::new(Arc::clone(&state.database));
    let database_connected = sessions.count().is_ok();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        retrieval_initialized: state.retriever.is_initialized(),
        database_connected,
    })
}
