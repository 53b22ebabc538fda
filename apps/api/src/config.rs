use std::str::FromStr;

use anyhow::{Context, Result};

use crate::chat::prompt::UploadPolicy;
use crate::llm_client::{GenerationConfig, DEFAULT_API_BASE};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Only typed parse failures abort startup; everything has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional at startup: without it generation stays disabled until a key
    /// is supplied through `PUT /api/v1/config`.
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub generation: GenerationConfig,
    pub inline_pdf_limit_bytes: u64,
    pub max_upload_bytes: usize,
    /// `None` keeps sessions until they are deleted.
    pub session_idle_ttl: Option<chrono::Duration>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = GenerationConfig::default();
        let generation = GenerationConfig {
            model_name: parse_env("GEMINI_MODEL", defaults.model_name)?,
            temperature: parse_env("GEMINI_TEMPERATURE", defaults.temperature)?,
            max_output_tokens: parse_env("GEMINI_MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
        };
        generation
            .validate()
            .context("GEMINI_* generation settings are out of range")?;

        let inline_pdf_limit_bytes = megabytes_to_bytes(
            "INLINE_PDF_LIMIT_MB",
            parse_env("INLINE_PDF_LIMIT_MB", UploadPolicy::DEFAULT_INLINE_PDF_LIMIT_MB)?,
        )?;
        let max_upload_bytes = usize::try_from(megabytes_to_bytes(
            "MAX_UPLOAD_MB",
            parse_env("MAX_UPLOAD_MB", 100)?,
        )?)
        .context("MAX_UPLOAD_MB does not fit in memory on this platform")?;

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            generation,
            inline_pdf_limit_bytes,
            max_upload_bytes,
            session_idle_ttl: idle_ttl(parse_env("SESSION_IDLE_TTL_MINUTES", 120)?)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn megabytes_to_bytes(key: &str, megabytes: u64) -> Result<u64> {
    megabytes
        .checked_mul(BYTES_PER_MB)
        .with_context(|| format!("Environment variable '{key}' is too large ({megabytes} MB)"))
}

/// 0 disables expiry.
fn idle_ttl(minutes: u64) -> Result<Option<chrono::Duration>> {
    if minutes == 0 {
        return Ok(None);
    }
    i64::try_from(minutes)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .map(Some)
        .with_context(|| {
            format!("Environment variable 'SESSION_IDLE_TTL_MINUTES' is too large ({minutes})")
        })
}
