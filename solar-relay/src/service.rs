//! Analyze orchestration
//!
//! Payload cleanup, one upstream call, verdict repair, and the fallback
//! decision. No retry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solar_common::config::FallbackMode;
use solar_common::time::now;
use solar_common::VerificationResult;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{info, warn};

use crate::fallback::FallbackVerdict;
use crate::upstream::VisionRequest;
use crate::verdict::{parse_verdict, ANALYZE_PROMPT, SYSTEM_INSTRUCTION};
use crate::AppState;

/// Used when the payload does not identify itself
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Base64 characters decoded for type sniffing
const SNIFF_CHARS: usize = 64;

/// How the relay will answer one analyze request
#[derive(Debug, Clone, PartialEq)]
pub enum RelayVerdict {
    /// Parsed model verdict
    Verified(VerificationResult),
    /// Upstream failed; canned verdict substituted
    Fallback {
        verdict: FallbackVerdict,
        reason: String,
    },
    /// Upstream failed and the relay reports it
    Unavailable { reason: String },
}

/// Run one analysis against the configured vision model
pub async fn analyze(state: &AppState, image_base64: &str) -> RelayVerdict {
    let (declared_mime, payload) = split_data_url(image_base64);
    let mime_type = sniff_mime_type(payload)
        .or(declared_mime.filter(|m| m.starts_with("image/")))
        .unwrap_or(DEFAULT_MIME_TYPE);

    let request = VisionRequest {
        system_instruction: SYSTEM_INSTRUCTION,
        prompt: ANALYZE_PROMPT,
        mime_type,
        image_base64: payload,
    };

    let started = Instant::now();
    let outcome = match state.upstream.generate(&request).await {
        Ok(text) => parse_verdict(&text, now()),
        Err(err) => Err(err),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            info!(
                model = state.upstream.name(),
                solar_installed = result.solar_installed,
                confidence = result.confidence,
                roof_type = %result.roof_type,
                elapsed_ms,
                "Analysis completed"
            );
            RelayVerdict::Verified(result)
        }
        Err(err) => {
            state.record_upstream_failure(&err).await;
            let reason = err.to_string();
            match state.fallback_mode {
                FallbackMode::Canned => {
                    state.fallbacks_served.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        code = err.code(),
                        error = %err,
                        elapsed_ms,
                        "Vision model failed, using fallback verdict"
                    );
                    RelayVerdict::Fallback {
                        verdict: FallbackVerdict::at(now()),
                        reason,
                    }
                }
                FallbackMode::Report => {
                    warn!(
                        code = err.code(),
                        error = %err,
                        elapsed_ms,
                        "Vision model failed, reporting upstream error"
                    );
                    RelayVerdict::Unavailable { reason }
                }
            }
        }
    }
}

/// Split `data:<mime>;base64,<payload>` into its declared MIME type and payload
///
/// Anything without a comma is taken as a bare payload.
pub fn split_data_url(image: &str) -> (Option<&str>, &str) {
    match image.split_once(',') {
        Some((header, payload)) if !payload.is_empty() => {
            let declared = header
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .filter(|mime| !mime.is_empty());
            (declared, payload)
        }
        _ => (None, image),
    }
}

/// Detect the image type from the payload's leading bytes
pub fn sniff_mime_type(image_base64: &str) -> Option<&'static str> {
    let head: String = image_base64
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .take(SNIFF_CHARS)
        .collect();
    if !head.is_ascii() {
        return None;
    }
    let usable = head.len() - head.len() % 4;
    let bytes = STANDARD.decode(&head[..usable]).ok()?;

    infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
}
