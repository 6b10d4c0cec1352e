//! Relay client
//!
//! One POST /analyze per call, no retry. Every way the call can end is folded
//! into an `AnalysisOutcome`; nothing here returns an error for a failed
//! analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solar_common::{AnalysisOutcome, VerificationResult};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, ReviewError};

const USER_AGENT: &str = concat!("solar-review/", env!("CARGO_PKG_VERSION"));

/// Something that can analyze one base64 rooftop image
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image_base64: &str) -> AnalysisOutcome;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody<'a> {
    image_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the relay's /analyze endpoint
#[derive(Debug, Clone)]
pub struct RelayClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| ReviewError::Client(format!("invalid relay URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ReviewError::Client(format!(
                "relay URL must be http or https: '{}'",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ReviewError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn analyze_url(&self) -> String {
        format!("{}/analyze", self.base_url)
    }
}

#[async_trait]
impl Analyzer for RelayClient {
    async fn analyze(&self, image_base64: &str) -> AnalysisOutcome {
        let body = AnalyzeBody {
            image_base64: strip_data_url(image_base64),
        };
        debug!(
            url = %self.analyze_url(),
            payload_len = body.image_base64.len(),
            "Sending analyze request"
        );

        let response = match self.http_client.post(self.analyze_url()).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Relay request failed");
                return AnalysisOutcome::failed(format!("relay unreachable: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                });
            warn!(status = status.as_u16(), error = %message, "Relay rejected analyze request");
            return AnalysisOutcome::failed(format!(
                "relay returned {}: {}",
                status.as_u16(),
                message
            ));
        }

        match response.json::<VerificationResult>().await {
            Ok(result) => {
                let outcome = AnalysisOutcome::from_relay_result(result);
                if outcome.is_degraded() {
                    warn!(
                        "Relay answered with its fallback verdict; result is not a real verification"
                    );
                }
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Relay response did not parse");
                AnalysisOutcome::failed(format!("unreadable relay response: {}", e))
            }
        }
    }
}

/// Drop a `data:<mime>;base64,` prefix if present
pub fn strip_data_url(image: &str) -> &str {
    match image.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => payload,
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,/9j/4AAQ"), "/9j/4AAQ");
        assert_eq!(strip_data_url("/9j/4AAQ"), "/9j/4AAQ");
        assert_eq!(strip_data_url("BATCH_PLACEHOLDER"), "BATCH_PLACEHOLDER");
    }

    #[test]
    fn test_relay_url_validation() {
        assert!(RelayClient::new("http://localhost:5000/", Duration::from_secs(1)).is_ok());
        assert!(RelayClient::new("localhost:5000", Duration::from_secs(1)).is_err());
        assert!(RelayClient::new("ftp://relay", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = RelayClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.analyze_url(), "http://localhost:5000/analyze");
    }
}
