//! Read-only views over the append-only scan report history.

use argus_core::ComponentResult;
use argus_db::ScanReportRow;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ReportsQuery {
    pub page: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportItem {
    id: i64,
    public_id: Uuid,
    page_name: String,
    cms_source_id: String,
    total_components: i32,
    components_with_anomalies: i32,
    total_anomalies: i32,
    status: String,
    error_message: Option<String>,
    document_origin: String,
    scan_time: DateTime<Utc>,
}

impl From<ScanReportRow> for ReportItem {
    fn from(row: ScanReportRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            page_name: row.page_name,
            cms_source_id: row.cms_source_id,
            total_components: row.total_components,
            components_with_anomalies: row.components_with_anomalies,
            total_anomalies: row.total_anomalies,
            status: row.status,
            error_message: row.error_message,
            document_origin: row.document_origin,
            scan_time: row.scan_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ReportDetail {
    #[serde(flatten)]
    report: ReportItem,
    component_results: Vec<ComponentResult>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportsSummary {
    total_reports: i64,
    total_anomalies: i64,
    reports_last_24h: i64,
    page_names: Vec<String>,
}

/// GET /api/v1/reports?page=&since=&limit=
///
/// Newest first. `page` and `since` may be combined.
pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<ApiResponse<Vec<ReportItem>>>, ApiError> {
    let limit = Some(normalize_limit(query.limit));
    let page = query.page.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let rows = match (page, query.since) {
        (Some(page), since) => {
            let rows = argus_db::list_scan_reports_for_page(&state.pool, page, limit).await;
            // Newest-first order makes the `since` window a prefix, so
            // filtering after the limit keeps the newest matches.
            rows.map(|rows| match since {
                Some(since) => rows.into_iter().filter(|r| r.scan_time >= since).collect(),
                None => rows,
            })
        }
        (None, Some(since)) => argus_db::list_scan_reports_since(&state.pool, since, limit).await,
        (None, None) => argus_db::list_scan_reports(&state.pool, limit).await,
    }
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(ReportItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/reports/:id
pub(super) async fn get_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportDetail>>, ApiError> {
    let row = argus_db::get_scan_report(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let component_results = row.component_results();
    let data = ReportDetail {
        report: ReportItem::from(row),
        component_results,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/reports/:id/components
pub(super) async fn list_report_components(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ComponentResult>>>, ApiError> {
    let row = argus_db::get_scan_report(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(row.component_results(), req_id.0)))
}

/// GET /api/v1/reports/summary
pub(super) async fn reports_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ReportsSummary>>, ApiError> {
    let rid = &req_id.0;
    let pool = &state.pool;
    let since = Utc::now() - Duration::hours(24);

    let (total_reports, total_anomalies, reports_last_24h, page_names) = tokio::try_join!(
        argus_db::count_scan_reports(pool),
        argus_db::sum_total_anomalies(pool),
        argus_db::count_scan_reports_since(pool, since),
        argus_db::list_scanned_page_names(pool),
    )
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = ReportsSummary {
        total_reports,
        total_anomalies,
        reports_last_24h,
        page_names,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
