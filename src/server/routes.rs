//! HTTP route handlers for the pantry agent API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::agent::storage_agent::DEFAULT_CONVERSATION;
use crate::common::errors::HomeError;
use crate::memory::conversation_id::ConversationId;
use crate::memory::turn::Turn;
use crate::pantry::entry::{LineItem, PantryEntry};
use crate::pantry::service::UseReport;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/pantry", get(get_food))
        .route("/api/pantry/save", post(save_food))
        .route("/api/pantry/use", post(use_food))
        .route(
            "/api/memory/{id}",
            get(get_turns).put(replace_turns).delete(delete_turns),
        )
        .route("/curl/chat", post(curl_chat))
        .with_state(state)
}

type ApiError = (StatusCode, String);

/// Map a core error onto an HTTP status.
fn api_error(err: HomeError) -> ApiError {
    let status = match &err {
        HomeError::Validation(_) => StatusCode::BAD_REQUEST,
        HomeError::Sqlite(_) | HomeError::TokioSqlite(_) => StatusCode::SERVICE_UNAVAILABLE,
        HomeError::HttpClient(_) | HomeError::Completion(_) => StatusCode::BAD_GATEWAY,
        HomeError::InvalidConfig(_) | HomeError::Serialization(_) | HomeError::Url(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!("Request failed: {err}");
    }
    (status, err.to_string())
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.app_name,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Batch of line items for save and use requests.
#[derive(Debug, Deserialize)]
pub struct ItemsRequest {
    /// Requested lines.
    pub items: Vec<LineItem>,
}

async fn get_food(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PantryEntry>>, ApiError> {
    let entries = state.pantry.get_food().await.map_err(api_error)?;
    Ok(Json(entries))
}

async fn save_food(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ItemsRequest>,
) -> Result<Json<Vec<PantryEntry>>, ApiError> {
    let saved = state
        .pantry
        .save_food(request.items)
        .await
        .map_err(api_error)?;
    Ok(Json(saved))
}

async fn use_food(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ItemsRequest>,
) -> Result<Json<UseReport>, ApiError> {
    let report = state
        .pantry
        .use_food(request.items)
        .await
        .map_err(api_error)?;
    Ok(Json(report))
}

/// Full replacement history for a conversation.
#[derive(Debug, Deserialize)]
pub struct TurnsRequest {
    /// Ordered turns, oldest first.
    pub turns: Vec<Turn>,
}

async fn get_turns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let turns = state
        .agent
        .memory()
        .get_turns(id)
        .await
        .map_err(api_error)?;
    Ok(Json(turns))
}

async fn replace_turns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<TurnsRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .agent
        .memory()
        .replace_turns(id, request.turns)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_turns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .agent
        .memory()
        .delete_turns(id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Plain chat request for use without a web UI.
#[derive(Debug, Deserialize)]
pub struct CurlChatRequest {
    /// The user's message.
    pub message: String,
    /// Conversation to continue. Must be a string when present.
    #[serde(default = "default_conversation")]
    pub conversation_id: serde_json::Value,
}

fn default_conversation() -> serde_json::Value {
    serde_json::Value::String(DEFAULT_CONVERSATION.to_string())
}

/// Plain chat response.
#[derive(Debug, Serialize)]
pub struct CurlChatResponse {
    /// The agent's reply.
    pub reply: String,
    /// Conversation the reply belongs to.
    pub conversation_id: ConversationId,
}

async fn curl_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurlChatRequest>,
) -> Result<Json<CurlChatResponse>, ApiError> {
    info!("Incoming chat request: {}", request.message);
    let conversation_id = ConversationId::try_from(request.conversation_id).map_err(api_error)?;

    let reply = state
        .agent
        .chat(&conversation_id, &request.message)
        .await
        .map_err(api_error)?;

    Ok(Json(CurlChatResponse {
        reply,
        conversation_id,
    }))
}
