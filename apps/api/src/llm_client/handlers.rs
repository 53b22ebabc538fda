//! Axum route handlers for the generation settings.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chat::attachment::ACCEPTED_EXTENSIONS;
use crate::errors::AppError;
use crate::llm_client::{GeminiModel, GenerationConfig};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GatewayStatusResponse {
    pub ready: bool,
    pub config: GenerationConfig,
    pub supported_models: Vec<GeminiModel>,
    /// File extensions a chat message may carry, for the client's file picker.
    pub accepted_extensions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Body of `PUT /api/v1/config`. Omitting `api_key` keeps the current key.
#[derive(Debug, Deserialize)]
pub struct ReconfigureRequest {
    #[serde(flatten)]
    pub config: GenerationConfig,
    pub api_key: Option<String>,
}

async fn current_status(state: &AppState) -> GatewayStatusResponse {
    let status = state.gateway.status().await;
    GatewayStatusResponse {
        ready: status.ready,
        config: status.config,
        supported_models: GeminiModel::ALL.to_vec(),
        accepted_extensions: ACCEPTED_EXTENSIONS.to_vec(),
        warning: (!status.ready)
            .then(|| "Please configure your Gemini API key to enable generation.".to_string()),
    }
}

/// GET /api/v1/config
pub async fn handle_get_config(State(state): State<AppState>) -> Json<GatewayStatusResponse> {
    Json(current_status(&state).await)
}

/// PUT /api/v1/config
pub async fn handle_reconfigure(
    State(state): State<AppState>,
    Json(request): Json<ReconfigureRequest>,
) -> Result<Json<GatewayStatusResponse>, AppError> {
    state
        .gateway
        .configure(request.config, request.api_key.as_deref())
        .await
        .map_err(|e| {
            warn!("Reconfigure rejected: {e}");
            AppError::from(e)
        })?;
    Ok(Json(current_status(&state).await))
}
