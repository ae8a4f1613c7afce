//! Database operations for the append-only `scan_reports` table.
//!
//! Rows are written once per page scan and never updated. The only
//! destructive operation is [`delete_scan_reports_before`], which removes
//! whole rows for retention.

use argus_core::{ComponentResult, DataOrigin, ScanStatus, ScanTotals};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `scan_reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanReportRow {
    pub id: i64,
    pub public_id: Uuid,
    pub page_name: String,
    pub cms_source_id: String,
    /// The schema defines the three counters as `INTEGER NOT NULL DEFAULT 0`.
    pub total_components: i32,
    pub components_with_anomalies: i32,
    pub total_anomalies: i32,
    /// JSON array of [`ComponentResult`] entries, in component order.
    pub component_results: serde_json::Value,
    pub status: String,
    pub error_message: Option<String>,
    /// `fallback` when the page document was the built-in stand-in rather
    /// than the CMS response.
    pub document_origin: String,
    pub scan_time: DateTime<Utc>,
}

impl ScanReportRow {
    #[must_use]
    pub fn used_fallback_document(&self) -> bool {
        self.document_origin == DataOrigin::Fallback.as_str()
    }

    /// Decodes the stored component results.
    ///
    /// A document that no longer decodes yields an empty list; the failure
    /// is logged rather than surfaced so old history stays browsable.
    #[must_use]
    pub fn component_results(&self) -> Vec<ComponentResult> {
        match serde_json::from_value::<Vec<ComponentResult>>(self.component_results.clone()) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(
                    report_id = self.id,
                    error = %e,
                    "failed to decode stored component results"
                );
                Vec::new()
            }
        }
    }

    /// Parses the stored status column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStoredValue`] for a status outside
    /// `completed` / `error`.
    pub fn scan_status(&self) -> Result<ScanStatus, DbError> {
        self.status
            .parse::<ScanStatus>()
            .map_err(|reason| DbError::InvalidStoredValue {
                column: "scan_reports.status",
                reason,
            })
    }
}

/// Values for a new scan report.
#[derive(Debug, Clone)]
pub struct NewScanReport {
    pub page_name: String,
    pub cms_source_id: String,
    pub totals: ScanTotals,
    pub component_results: Vec<ComponentResult>,
    pub status: ScanStatus,
    pub error_message: Option<String>,
    pub document_origin: DataOrigin,
    pub scan_time: DateTime<Utc>,
}

impl NewScanReport {
    /// A `completed` report with totals derived from `results`.
    #[must_use]
    pub fn completed(page_name: &str, cms_source_id: &str, results: Vec<ComponentResult>) -> Self {
        Self {
            page_name: page_name.to_string(),
            cms_source_id: cms_source_id.to_string(),
            totals: ScanTotals::from_results(&results),
            component_results: results,
            status: ScanStatus::Completed,
            error_message: None,
            document_origin: DataOrigin::Live,
            scan_time: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_document_origin(mut self, origin: DataOrigin) -> Self {
        self.document_origin = origin;
        self
    }

    /// An `error` report with zero totals and no component results.
    #[must_use]
    pub fn failed(page_name: &str, cms_source_id: &str, error: impl Into<String>) -> Self {
        Self {
            page_name: page_name.to_string(),
            cms_source_id: cms_source_id.to_string(),
            totals: ScanTotals::default(),
            component_results: Vec::new(),
            status: ScanStatus::Error,
            error_message: Some(error.into()),
            document_origin: DataOrigin::Live,
            scan_time: Utc::now(),
        }
    }
}

const COLUMNS: &str = "id, public_id, page_name, cms_source_id, total_components, \
                       components_with_anomalies, total_anomalies, component_results, \
                       status, error_message, document_origin, scan_time";

fn count_to_i32(column: &'static str, value: usize) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|_| DbError::InvalidStoredValue {
        column,
        reason: format!("{value} does not fit in INTEGER"),
    })
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Appends a scan report and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::InvalidStoredValue`] if a counter overflows `INTEGER`
/// or the component results cannot be encoded, or [`DbError::Sqlx`] if the
/// insert fails.
pub async fn insert_scan_report(
    pool: &PgPool,
    report: &NewScanReport,
) -> Result<ScanReportRow, DbError> {
    let total_components =
        count_to_i32("scan_reports.total_components", report.totals.total_components)?;
    let components_with_anomalies = count_to_i32(
        "scan_reports.components_with_anomalies",
        report.totals.components_with_anomalies,
    )?;
    let total_anomalies =
        count_to_i32("scan_reports.total_anomalies", report.totals.total_anomalies)?;
    let component_results = serde_json::to_value(&report.component_results).map_err(|e| {
        DbError::InvalidStoredValue {
            column: "scan_reports.component_results",
            reason: e.to_string(),
        }
    })?;

    let row = sqlx::query_as::<_, ScanReportRow>(&format!(
        "INSERT INTO scan_reports \
             (public_id, page_name, cms_source_id, total_components, \
              components_with_anomalies, total_anomalies, component_results, \
              status, error_message, document_origin, scan_time) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&report.page_name)
    .bind(&report.cms_source_id)
    .bind(total_components)
    .bind(components_with_anomalies)
    .bind(total_anomalies)
    .bind(component_results)
    .bind(report.status.as_str())
    .bind(report.error_message.as_deref())
    .bind(report.document_origin.as_str())
    .bind(report.scan_time)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Deletes every report with `scan_time` strictly before `cutoff`.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_scan_reports_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM scan_reports WHERE scan_time < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    let deleted = result.rows_affected();
    tracing::info!(deleted, %cutoff, "pruned scan reports");
    Ok(deleted)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetches a single report by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the id, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_scan_report(pool: &PgPool, id: i64) -> Result<ScanReportRow, DbError> {
    sqlx::query_as::<_, ScanReportRow>(&format!(
        "SELECT {COLUMNS} FROM scan_reports WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Lists reports newest first. `None` returns every row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_reports(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<ScanReportRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanReportRow>(&format!(
        "SELECT {COLUMNS} FROM scan_reports \
         ORDER BY scan_time DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists one page's reports newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_reports_for_page(
    pool: &PgPool,
    page_name: &str,
    limit: Option<i64>,
) -> Result<Vec<ScanReportRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanReportRow>(&format!(
        "SELECT {COLUMNS} FROM scan_reports \
         WHERE page_name = $1 \
         ORDER BY scan_time DESC, id DESC \
         LIMIT $2"
    ))
    .bind(page_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists reports with `scan_time >= since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_reports_since(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: Option<i64>,
) -> Result<Vec<ScanReportRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanReportRow>(&format!(
        "SELECT {COLUMNS} FROM scan_reports \
         WHERE scan_time >= $1 \
         ORDER BY scan_time DESC, id DESC \
         LIMIT $2"
    ))
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct page names that have at least one report, alphabetically.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scanned_page_names(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT page_name FROM scan_reports ORDER BY page_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(names)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_scan_reports(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scan_reports")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Number of reports with `scan_time >= since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_scan_reports_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scan_reports WHERE scan_time >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Sum of `total_anomalies` across all reports; `0` when the table is empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn sum_total_anomalies(pool: &PgPool) -> Result<i64, DbError> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(total_anomalies), 0)::BIGINT FROM scan_reports",
    )
    .fetch_one(pool)
    .await?;

    Ok(sum)
}
