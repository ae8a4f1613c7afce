use argus_scanner::{ScanError, ScanSummary};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::reports::ReportItem;
use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct PageScanItem {
    page_name: String,
    /// `true` when the page resolved to zero components and no report was
    /// written.
    skipped: bool,
    report: Option<ReportItem>,
}

fn map_scan_error(request_id: String, error: &ScanError) -> ApiError {
    match error {
        ScanError::AlreadyRunning => ApiError::new(request_id, "conflict", error.to_string()),
        ScanError::PageNotFound(_) => ApiError::new(request_id, "not_found", error.to_string()),
        ScanError::Persistence(db) => map_db_error(request_id, db),
    }
}

/// POST /api/v1/scans
///
/// Scans every active page and responds once the run has finished.
pub(super) async fn scan_all_pages(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ScanSummary>>, ApiError> {
    tracing::info!("manual scan of all active pages requested");
    let summary = state
        .scanner
        .run_exclusive()
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(summary, req_id.0)))
}

/// POST /api/v1/scans/:page_name
pub(super) async fn scan_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(page_name): Path<String>,
) -> Result<Json<ApiResponse<PageScanItem>>, ApiError> {
    tracing::info!(page = %page_name, "manual page scan requested");
    let report = state
        .scanner
        .scan_page_by_name(&page_name)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    let data = PageScanItem {
        page_name,
        skipped: report.is_none(),
        report: report.map(ReportItem::from),
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
