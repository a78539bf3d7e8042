//! Axum Handlers for the Tutoring API
//!
//! This module contains the chat and progress endpoints and the shared
//! `ApiError` type. It uses `utoipa` doc comments to generate OpenAPI
//! documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tutor_core::{ConversationTurn, LessonContext, TopicPhase};

use crate::{
    middleware::AuthUser,
    models::{ChatPayload, ChatResponse, ErrorResponse, ProgressRecord},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    Timeout(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Timeout(message) => (StatusCode::GATEWAY_TIMEOUT, message),
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Run one tutoring turn for the signed-in learner.
///
/// A progress directive is only honored (and recorded) once the tutor has
/// posed a task, i.e. the history already contains a tutor turn.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "Tutor reply", body = ChatResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 504, description = "The tutor did not answer in time", body = ErrorResponse)
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.topic_name.trim().is_empty() {
        return Err(ApiError::BadRequest("topic_name is required".to_string()));
    }
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }

    let lesson = LessonContext::new(payload.topic_id, payload.topic_name, payload.topic_content);
    let history: Vec<ConversationTurn> = payload.history.into_iter().map(Into::into).collect();
    let phase = TopicPhase::from_history(&history);

    let mut reply = tokio::time::timeout(
        state.config.chat_timeout,
        state.tutor.conduct(&lesson, &history, &payload.message),
    )
    .await
    .map_err(|_| {
        warn!(topic_id = %lesson.topic_id, "Tutoring turn timed out.");
        ApiError::Timeout("The tutor took too long to answer. Please try again.".to_string())
    })?;

    if let Some(directive) = reply.directive.take() {
        if phase.accepts(&directive) {
            match state.store.record_progress(user.user_id, &directive).await {
                Ok(record) => info!(
                    user_id = %user.user_id,
                    subtopic_id = %record.subtopic_id,
                    status = %record.status,
                    "Progress recorded."
                ),
                Err(e) => error!(error = ?e, "Failed to record progress."),
            }
            reply.directive = Some(directive);
        } else {
            warn!(
                subtopic_id = %directive.subtopic_id,
                "Ignoring progress directive issued before any task was posed."
            );
        }
    }

    Ok(Json(ChatResponse::new(&reply, phase.after_reply(&reply))))
}

/// List the signed-in learner's recorded progress, most recent first.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Recorded progress", body = [ProgressRecord]),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ProgressRecord>>, ApiError> {
    let records = state.store.list_progress(user.user_id).await?;
    Ok(Json(records))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
