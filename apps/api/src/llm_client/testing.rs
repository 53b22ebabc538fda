//! In-memory `ModelGateway` used by turn, router and recommendation tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    validate_credential, ContentPart, FileReference, GatewayError, GatewayStatus,
    GenerationConfig, ModelGateway,
};

/// Replays scripted replies and records every call it receives.
pub struct ScriptedGateway {
    ready: Mutex<bool>,
    config: Mutex<GenerationConfig>,
    replies: Mutex<VecDeque<Result<String, String>>>,
    upload_failure: Option<String>,
    uploads: Mutex<Vec<(String, usize)>>,
    requests: Mutex<Vec<Vec<ContentPart>>>,
}

impl ScriptedGateway {
    /// Ready gateway that answers every generate call with "ok".
    pub fn new() -> Self {
        Self::scripted(VecDeque::new())
    }

    pub fn replying<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::scripted(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing(message: &str) -> Self {
        Self::scripted(VecDeque::from([Err(message.to_string())]))
    }

    pub fn unconfigured() -> Self {
        let gateway = Self::scripted(VecDeque::new());
        *gateway.ready.lock().unwrap() = false;
        gateway
    }

    pub fn with_failing_uploads(mut self, message: &str) -> Self {
        self.upload_failure = Some(message.to_string());
        self
    }

    fn scripted(replies: VecDeque<Result<String, String>>) -> Self {
        Self {
            ready: Mutex::new(true),
            config: Mutex::new(GenerationConfig::default()),
            replies: Mutex::new(replies),
            upload_failure: None,
            uploads: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `(mime_type, size)` of every upload, in call order.
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().unwrap().clone()
    }

    /// Content sequences passed to `generate`, in call order.
    pub fn requests(&self) -> Vec<Vec<ContentPart>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn configure(
        &self,
        config: GenerationConfig,
        credential: Option<&str>,
    ) -> Result<(), GatewayError> {
        config.validate()?;
        if let Some(credential) = credential {
            validate_credential(credential)?;
        } else if !*self.ready.lock().unwrap() {
            return Err(GatewayError::Auth("no API key has been supplied".to_string()));
        }
        *self.config.lock().unwrap() = config;
        *self.ready.lock().unwrap() = true;
        Ok(())
    }

    async fn status(&self) -> GatewayStatus {
        GatewayStatus {
            ready: *self.ready.lock().unwrap(),
            config: self.config.lock().unwrap().clone(),
        }
    }

    async fn upload(
        &self,
        payload: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileReference, GatewayError> {
        if let Some(message) = &self.upload_failure {
            return Err(GatewayError::Transport(message.clone()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((mime_type.to_string(), payload.len()));
        let id = uploads.len();
        Ok(FileReference {
            name: format!("files/{id}-{display_name}"),
            uri: format!("https://files.test/{id}"),
            mime_type: mime_type.to_string(),
        })
    }

    async fn generate(&self, content: &[ContentPart]) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(content.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GatewayError::Generation(message)),
            None => Ok("ok".to_string()),
        }
    }
}
