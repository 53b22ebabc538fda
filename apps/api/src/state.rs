use std::sync::Arc;

use crate::chat::prompt::UploadPolicy;
use crate::chat::store::SessionStore;
use crate::llm_client::ModelGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Process-wide model gateway. Reconfigured through `PUT /api/v1/config`.
    pub gateway: Arc<dyn ModelGateway>,
    pub upload_policy: UploadPolicy,
}
