use argus_core::DetectionResult;
use argus_scanner::DetectError;
use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DetectRequest {
    #[serde(default, rename = "bannerURL", alias = "bannerUrl")]
    banner_url: String,
    #[serde(default, rename = "catalogId", alias = "curatedId")]
    catalog_id: String,
}

pub(super) async fn detect_anomalies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DetectRequest>,
) -> Result<Json<ApiResponse<DetectionResult>>, ApiError> {
    let result = state
        .scanner
        .detector()
        .detect(&body.banner_url, &body.catalog_id)
        .await
        .map_err(|e| map_detect_error(req_id.0.clone(), &e))?;

    tracing::info!(
        banner_url = %result.banner_url,
        catalog_id = %result.catalog_id,
        total_anomalies = result.total_anomalies,
        used_fallback = result.used_fallback(),
        "anomaly detection served"
    );

    Ok(Json(ApiResponse::new(result, req_id.0)))
}

fn map_detect_error(request_id: String, error: &DetectError) -> ApiError {
    match error {
        DetectError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        DetectError::Signal(_) | DetectError::Catalog(_) => {
            tracing::error!(error = %error, "anomaly detection failed");
            ApiError::new(request_id, "upstream_error", error.to_string())
        }
    }
}
