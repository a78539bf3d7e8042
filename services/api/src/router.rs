//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, the session guard, and OpenAPI documentation.

use crate::{
    auth,
    handlers,
    middleware::require_session,
    models::{
        ChatPayload, ChatResponse, CurrentUserResponse, DirectiveResponse, ErrorResponse,
        LoginPayload, ProgressRecord, RegisterPayload, Role, TurnPayload, TurnSpeaker,
        UserResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::me,
        handlers::chat,
        handlers::list_progress,
        handlers::health,
    ),
    components(
        schemas(
            RegisterPayload, LoginPayload, UserResponse, CurrentUserResponse, Role,
            ChatPayload, TurnPayload, TurnSpeaker, ChatResponse, DirectiveResponse,
            ProgressRecord, ErrorResponse
        )
    ),
    tags(
        (name = "Tutor API", description = "Accounts and tutoring turns for the AI tutor")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/logout", post(auth::handlers::logout))
        .route("/auth/me", get(auth::handlers::me))
        .route("/chat", post(handlers::chat))
        .route("/progress", get(handlers::list_progress))
        .route("/health", get(handlers::health))
        .with_state(app_state.clone());

    // The guard wraps everything, fallback included, so unknown paths under a
    // protected prefix are still refused to anonymous callers.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(axum::middleware::from_fn_with_state(
            app_state,
            require_session,
        ))
}
