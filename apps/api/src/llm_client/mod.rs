/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the model API directly.
/// Chat turns and recommendations go through `ModelGateway`, which lets the
/// turn pipeline run against a scripted gateway in tests.
///
/// The Gemini implementation is a direct pass-through: one HTTP call per
/// generate or upload, no retry, no backoff.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod handlers;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API key is missing or invalid: {0}")]
    Auth(String),

    #[error("Invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("Model gateway is not configured. Please configure your API key.")]
    NotConfigured,

    #[error("Upload failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Generation(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Generation config
// ────────────────────────────────────────────────────────────────────────────

/// Models the chat surface lets a user pick from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeminiModel {
    #[default]
    #[serde(rename = "gemini-2.0-flash-exp")]
    Flash2Exp,
    #[serde(rename = "gemini-1.5-flash")]
    Flash15,
    #[serde(rename = "gemini-1.5-pro")]
    Pro15,
}

impl GeminiModel {
    pub const ALL: [GeminiModel; 3] = [
        GeminiModel::Flash2Exp,
        GeminiModel::Flash15,
        GeminiModel::Pro15,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GeminiModel::Flash2Exp => "gemini-2.0-flash-exp",
            GeminiModel::Flash15 => "gemini-1.5-flash",
            GeminiModel::Pro15 => "gemini-1.5-pro",
        }
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GeminiModel {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        GeminiModel::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| GatewayError::InvalidConfig(format!("unsupported model '{s}'")))
    }
}

/// Process-wide generation settings. Applies to every generation after it is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_name: GeminiModel,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_name: GeminiModel::default(),
            temperature: 1.0,
            max_output_tokens: 2048,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(GatewayError::InvalidConfig(format!(
                "temperature must be between 0.0 and {MAX_TEMPERATURE}, got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejects credentials that could never authenticate.
pub fn validate_credential(credential: &str) -> Result<String, GatewayError> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(GatewayError::Auth("API key is empty".to_string()));
    }
    if credential.chars().any(char::is_whitespace) {
        return Err(GatewayError::Auth(
            "API key must not contain whitespace".to_string(),
        ));
    }
    Ok(credential.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway contract
// ────────────────────────────────────────────────────────────────────────────

/// Reference to a file stored server-side by an out-of-band upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

/// One element of the ordered content sequence sent in a generate call.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Inline { mime_type: String, data: Bytes },
    File(FileReference),
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub ready: bool,
    pub config: GenerationConfig,
}

/// The model API as seen by the chat core.
///
/// Carried in `AppState` as `Arc<dyn ModelGateway>`.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Replaces the generation config. `None` keeps the current credential.
    async fn configure(
        &self,
        config: GenerationConfig,
        credential: Option<&str>,
    ) -> Result<(), GatewayError>;

    async fn status(&self) -> GatewayStatus;

    async fn upload(
        &self,
        payload: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileReference, GatewayError>;

    async fn generate(&self, content: &[ContentPart]) -> Result<String, GatewayError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<WireContent<'a>>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob<'a>,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: WireFileData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFileResource {
    name: String,
    uri: String,
    mime_type: Option<String>,
}

fn build_generate_request<'a>(
    content: &'a [ContentPart],
    config: &GenerationConfig,
) -> GenerateContentRequest<'a> {
    let parts = content
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => WirePart::Text { text },
            ContentPart::Inline { mime_type, data } => WirePart::Inline {
                inline_data: WireBlob {
                    mime_type,
                    data: STANDARD.encode(data),
                },
            },
            ContentPart::File(reference) => WirePart::File {
                file_data: WireFileData {
                    mime_type: &reference.mime_type,
                    file_uri: &reference.uri,
                },
            },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![WireContent {
            role: "user",
            parts,
        }],
        generation_config: WireGenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        },
    }
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Result<String, GatewayError> {
        if let Some(usage) = &self.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(GatewayError::Generation(format!(
                "the model returned no response ({reason})"
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(GatewayError::Generation(format!(
                "the model returned empty content (finish reason: {reason})"
            )));
        }

        Ok(text)
    }
}

/// Pulls the human-readable message out of a Google API error body.
fn api_error_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    format!("API error (status {}): {message}", status.as_u16())
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

struct Settings {
    config: GenerationConfig,
    api_key: Option<String>,
}

/// Gemini `generateContent` + Files API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    settings: Arc<RwLock<Settings>>,
}

impl GeminiClient {
    /// Builds an unconfigured client. Generation stays disabled until
    /// `configure` succeeds.
    pub fn new(api_base: &str, config: GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            settings: Arc::new(RwLock::new(Settings {
                config,
                api_key: None,
            })),
        })
    }

    /// Copies the settings so a concurrent reconfigure never affects an in-flight call.
    async fn snapshot(&self) -> Result<(GenerationConfig, String), GatewayError> {
        let settings = self.settings.read().await;
        let api_key = settings
            .api_key
            .clone()
            .ok_or(GatewayError::NotConfigured)?;
        Ok((settings.config.clone(), api_key))
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn configure(
        &self,
        config: GenerationConfig,
        credential: Option<&str>,
    ) -> Result<(), GatewayError> {
        config.validate()?;

        let mut settings = self.settings.write().await;
        let api_key = match credential {
            Some(credential) => validate_credential(credential)?,
            None => settings.api_key.clone().ok_or_else(|| {
                GatewayError::Auth("no API key has been supplied".to_string())
            })?,
        };

        info!(
            "Model gateway configured: model={}, temperature={}, max_output_tokens={}",
            config.model_name, config.temperature, config.max_output_tokens
        );
        settings.config = config;
        settings.api_key = Some(api_key);
        Ok(())
    }

    async fn status(&self) -> GatewayStatus {
        let settings = self.settings.read().await;
        GatewayStatus {
            ready: settings.api_key.is_some(),
            config: settings.config.clone(),
        }
    }

    async fn upload(
        &self,
        payload: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<FileReference, GatewayError> {
        let (_, api_key) = self.snapshot().await?;
        let url = format!("{}/upload/{API_VERSION}/files", self.api_base);
        let size = payload.len();

        let metadata = serde_json::json!({ "file": { "display_name": display_name } });
        let metadata_part = multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let file_part = multipart::Part::bytes(payload.to_vec())
            .file_name(display_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| GatewayError::Transport(format!("invalid mime type '{mime_type}': {e}")))?;
        let form = multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        debug!("Uploading {display_name} ({size} bytes, {mime_type}) to the Files API");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &api_key)
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Files API returned {status}");
            return Err(GatewayError::Transport(api_error_message(status, &body)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("malformed upload response: {e}")))?;

        info!("Uploaded {display_name} as {}", uploaded.file.name);

        Ok(FileReference {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn generate(&self, content: &[ContentPart]) -> Result<String, GatewayError> {
        let (config, api_key) = self.snapshot().await?;
        let url = format!(
            "{}/{API_VERSION}/models/{}:generateContent",
            self.api_base, config.model_name
        );
        let request_body = build_generate_request(content, &config);

        debug!(
            "Calling {} with {} content parts",
            config.model_name,
            content.len()
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GatewayError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {status}");
            return Err(GatewayError::Generation(api_error_message(status, &body)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Generation(format!("malformed response: {e}")))?;

        parsed.into_text()
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Multipart, Path, State},
        http::HeaderMap,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorded {
        calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn spawn_fake_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn configured_client(base: &str) -> GeminiClient {
        let client = GeminiClient::new(base, GenerationConfig::default()).unwrap();
        client
            .configure(
                GenerationConfig {
                    model_name: GeminiModel::Flash15,
                    temperature: 0.4,
                    max_output_tokens: 512,
                },
                Some("test-key"),
            )
            .await
            .unwrap();
        client
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_model_ids_round_trip_through_from_str() {
        for model in GeminiModel::ALL {
            assert_eq!(model.id().parse::<GeminiModel>().unwrap(), model);
        }
        assert!("gpt-4".parse::<GeminiModel>().is_err());
    }

    #[test]
    fn test_model_serializes_as_api_identifier() {
        let json = serde_json::to_string(&GeminiModel::Pro15).unwrap();
        assert_eq!(json, r#""gemini-1.5-pro""#);
    }

    #[test]
    fn test_default_config_matches_chat_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.model_name, GeminiModel::Flash2Exp);
        assert!((config.temperature - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.max_output_tokens, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_out_of_range_values() {
        let hot = GenerationConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert!(matches!(hot.validate(), Err(GatewayError::InvalidConfig(_))));

        let empty = GenerationConfig {
            max_output_tokens: 0,
            ..Default::default()
        };
        assert!(matches!(empty.validate(), Err(GatewayError::InvalidConfig(_))));
    }

    #[test]
    fn test_credential_validation() {
        assert!(matches!(validate_credential(""), Err(GatewayError::Auth(_))));
        assert!(matches!(validate_credential("   "), Err(GatewayError::Auth(_))));
        assert!(matches!(validate_credential("ab cd"), Err(GatewayError::Auth(_))));
        assert_eq!(validate_credential(" key-123 ").unwrap(), "key-123");
    }

    #[test]
    fn test_request_body_uses_camel_case_and_base64() {
        let content = vec![
            ContentPart::Inline {
                mime_type: "image/png".to_string(),
                data: Bytes::from_static(b"abc"),
            },
            ContentPart::File(FileReference {
                name: "files/xyz".to_string(),
                uri: "https://example.test/files/xyz".to_string(),
                mime_type: "audio/mpeg".to_string(),
            }),
            ContentPart::Text("Describe these".to_string()),
        ];
        let body = build_generate_request(&content, &GenerationConfig::default());
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": "YWJj"}},
                        {"fileData": {"mimeType": "audio/mpeg", "fileUri": "https://example.test/files/xyz"}},
                        {"text": "Describe these"}
                    ]
                }],
                "generationConfig": {"temperature": 1.0, "maxOutputTokens": 2048}
            })
        );
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hi "}, {"text": "there"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2}
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Hi there");
    }

    #[test]
    fn test_blocked_prompt_is_a_generation_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_api_error_message_prefers_error_body() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let message = api_error_message(StatusCode::BAD_REQUEST, body);
        assert_eq!(message, "API error (status 400): API key not valid");

        let raw = api_error_message(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(raw, "API error (status 502): upstream down");
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses_to_generate() {
        let client = GeminiClient::new("http://127.0.0.1:9", GenerationConfig::default()).unwrap();
        assert!(!client.status().await.ready);
        let err = client.generate(&[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
    }

    #[tokio::test]
    async fn test_configure_without_credential_keeps_existing_key() {
        let client = GeminiClient::new("http://127.0.0.1:9", GenerationConfig::default()).unwrap();
        let err = client
            .configure(GenerationConfig::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));

        client
            .configure(GenerationConfig::default(), Some("first-key"))
            .await
            .unwrap();
        let switched = GenerationConfig {
            model_name: GeminiModel::Pro15,
            ..Default::default()
        };
        client.configure(switched.clone(), None).await.unwrap();

        let status = client.status().await;
        assert!(status.ready);
        assert_eq!(status.config, switched);
    }

    #[tokio::test]
    async fn test_generate_posts_to_selected_model() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/v1beta/models/:call",
                post(
                    |State(rec): State<Recorded>,
                     Path(call): Path<String>,
                     headers: HeaderMap,
                     Json(body): Json<Value>| async move {
                        let key = headers
                            .get(API_KEY_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        rec.calls.lock().unwrap().push((call, key, body));
                        Json(json!({
                            "candidates": [{"content": {"parts": [{"text": "Hi there"}]}}]
                        }))
                    },
                ),
            )
            .with_state(recorded.clone());
        let base = spawn_fake_api(router).await;
        let client = configured_client(&base).await;

        let reply = client
            .generate(&[ContentPart::Text("Hello".to_string())])
            .await
            .unwrap();
        assert_eq!(reply, "Hi there");

        let calls = recorded.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (call, key, body) = &calls[0];
        assert_eq!(call, "gemini-1.5-flash:generateContent");
        assert_eq!(key.as_deref(), Some("test-key"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[tokio::test]
    async fn test_generate_maps_api_errors() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                (
                    axum::http::StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"code": 429, "message": "Quota exceeded"}})),
                )
            }),
        );
        let base = spawn_fake_api(router).await;
        let client = configured_client(&base).await;

        let err = client
            .generate(&[ContentPart::Text("Hello".to_string())])
            .await
            .unwrap_err();
        match err {
            GatewayError::Generation(message) => {
                assert!(message.contains("429"));
                assert!(message.contains("Quota exceeded"));
            }
            other => panic!("expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_returns_file_reference() {
        let router = Router::new().route(
            "/upload/v1beta/files",
            post(|mut multipart: Multipart| async move {
                let mut names = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    names.push(field.name().unwrap_or_default().to_string());
                    let _ = field.bytes().await.unwrap();
                }
                assert_eq!(names, vec!["metadata", "file"]);
                Json(json!({
                    "file": {
                        "name": "files/abc123",
                        "uri": "https://example.test/v1beta/files/abc123",
                        "mimeType": "audio/mpeg",
                        "state": "ACTIVE"
                    }
                }))
            }),
        );
        let base = spawn_fake_api(router).await;
        let client = configured_client(&base).await;

        let reference = client
            .upload(Bytes::from_static(b"ID3fake"), "audio/mpeg", "song.mp3")
            .await
            .unwrap();
        assert_eq!(reference.name, "files/abc123");
        assert_eq!(reference.uri, "https://example.test/v1beta/files/abc123");
        assert_eq!(reference.mime_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_upload_failure_is_transport_error() {
        let router = Router::new().route(
            "/upload/v1beta/files",
            post(|| async {
                (
                    axum::http::StatusCode::FORBIDDEN,
                    Json(json!({"error": {"code": 403, "message": "Permission denied"}})),
                )
            }),
        );
        let base = spawn_fake_api(router).await;
        let client = configured_client(&base).await;

        let err = client
            .upload(Bytes::from_static(b"%PDF"), "application/pdf", "cv.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(ref m) if m.contains("Permission denied")));
    }
}
