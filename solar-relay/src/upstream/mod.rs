//! Vision model boundary
//!
//! The relay's only upstream dependency: something that takes an image plus
//! instruction text and answers with free-form text that should parse as JSON.

pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Upstream failures
///
/// Every variant ends up on the relay's fallback path.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Stable code for logs and error bodies
    pub fn code(&self) -> &'static str {
        match self {
            UpstreamError::MissingApiKey => "MISSING_API_KEY",
            UpstreamError::InvalidApiKey => "INVALID_API_KEY",
            UpstreamError::QuotaExhausted(_) => "QUOTA_EXHAUSTED",
            UpstreamError::Network(_) => "NETWORK_ERROR",
            UpstreamError::Api(_, _) => "API_ERROR",
            UpstreamError::EmptyResponse => "EMPTY_RESPONSE",
            UpstreamError::Parse(_) => "PARSE_ERROR",
        }
    }
}

/// One image-understanding request
#[derive(Debug, Clone)]
pub struct VisionRequest<'a> {
    /// Task description applied at system level
    pub system_instruction: &'a str,
    /// Per-request instruction sent alongside the image
    pub prompt: &'a str,
    pub mime_type: &'a str,
    /// Base64 image bytes, no data-URL prefix
    pub image_base64: &'a str,
}

/// Image-understanding capability
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier for logs and /health
    fn name(&self) -> &str;

    /// Run one request and return the model's raw text output
    async fn generate(&self, request: &VisionRequest<'_>) -> Result<String, UpstreamError>;
}
