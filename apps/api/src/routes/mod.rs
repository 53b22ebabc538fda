pub mod form;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::llm_client::handlers as settings;
use crate::recommend::handlers as recommend;
use crate::state::AppState;

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation settings
        .route(
            "/api/v1/config",
            get(settings::handle_get_config).put(settings::handle_reconfigure),
        )
        // Chat sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_submit),
        )
        .route("/api/v1/sessions/:id/edit", post(handlers::handle_begin_edit))
        .route(
            "/api/v1/sessions/:id/edit/commit",
            post(handlers::handle_commit_edit),
        )
        .route(
            "/api/v1/sessions/:id/edit/cancel",
            post(handlers::handle_cancel_edit),
        )
        .route("/api/v1/sessions/:id/clear", post(handlers::handle_clear))
        // CV → job recommendations
        .route(
            "/api/v1/recommendations",
            post(recommend::handle_recommend),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
