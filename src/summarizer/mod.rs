//! Text summarization through an external generative-language service
//!
//! The service is opaque: text goes in, a summary or a failure comes out.
//! Two failures are caught before any request is made (blank text and a
//! missing API key); everything that goes wrong during the call collapses
//! into one generic user-facing message while the cause is logged.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini REST base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Generic message for any failure during the call
pub const CALL_FAILED_MESSAGE: &str =
    "Özetleme sırasında bir hata oluştu. Lütfen daha sonra tekrar deneyin.";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection settings for the summarization service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Only ever taken from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Summarization failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummarizeError {
    #[error("Lütfen özetlenecek bir metin girin.")]
    EmptyText,

    #[error("API anahtarı bulunamadı. Lütfen ortam değişkenlerini kontrol edin.")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SummarizeError {
    /// True for failures detected before a request is sent
    pub fn is_preflight(&self) -> bool {
        matches!(self, SummarizeError::EmptyText | SummarizeError::MissingApiKey)
    }

    /// Message to show the user. Call failures never expose their cause.
    pub fn user_message(&self) -> String {
        if self.is_preflight() {
            self.to_string()
        } else {
            CALL_FAILED_MESSAGE.to_string()
        }
    }
}

/// Anything that can turn text into a summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Pre-flight check for credentials and configuration
    fn check_ready(&self) -> Result<(), SummarizeError>;

    /// Summarize non-empty text
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}

/// Instruction sent to the model ahead of the user's text
pub fn build_prompt(text: &str) -> String {
    format!("Aşağıdaki metni özetle: {}", text)
}

/// Checks made before any request: non-blank text, then credentials
pub fn preflight<S>(summarizer: &S, text: &str) -> Result<(), SummarizeError>
where
    S: Summarizer + ?Sized,
{
    if text.trim().is_empty() {
        return Err(SummarizeError::EmptyText);
    }
    summarizer.check_ready()
}

/// Run the pre-flight checks, then one summarization call
pub async fn summarize_text<S>(summarizer: &S, text: &str) -> Result<String, SummarizeError>
where
    S: Summarizer + ?Sized,
{
    preflight(summarizer, text)?;

    log::info!("requesting summary for {} characters of text", text.chars().count());
    match summarizer.summarize(text).await {
        Ok(summary) => {
            log::info!("summary received ({} characters)", summary.chars().count());
            Ok(summary)
        }
        Err(e) => {
            log::error!("summarization failed: {}", e);
            Err(e)
        }
    }
}
