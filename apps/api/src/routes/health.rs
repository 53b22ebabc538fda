use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and gateway readiness.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let gateway = state.gateway.status().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "chat-api",
        "generation_ready": gateway.ready,
        "active_sessions": state.sessions.len().await
    }))
}
