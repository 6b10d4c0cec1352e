//! POST /analyze
//!
//! Request `{"imageBase64": "..."}`; answers with a verification result, the
//! canned fallback verdict, or an error body.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::service::{self, RelayVerdict};
use crate::AppState;

/// POST /analyze request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// POST /analyze
///
/// A missing or blank image is rejected before any upstream call.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = match payload {
        Ok(json) => json,
        // Body ceiling keeps its 413
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!("Rejected oversized analyze request");
            return Ok(rejection.into_response());
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected malformed analyze request");
            return Err(ApiError::BadRequest(rejection.body_text()));
        }
    };

    let image = request
        .image_base64
        .as_deref()
        .map(str::trim)
        .filter(|image| !image.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image missing".to_string()))?;

    match service::analyze(&state, image).await {
        RelayVerdict::Verified(result) => Ok(Json(result).into_response()),
        RelayVerdict::Fallback { verdict, .. } => Ok(Json(verdict).into_response()),
        RelayVerdict::Unavailable { reason } => Err(ApiError::Upstream(reason)),
    }
}

/// Build analyze routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}
