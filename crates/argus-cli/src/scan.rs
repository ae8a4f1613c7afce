//! Scan and detection command handlers.
//!
//! Both share the adapter wiring of the server so a CLI run behaves like a
//! scheduled one, including fallbacks when an upstream is unavailable.

use std::sync::Arc;

use argus_clients::{CatalogClient, VisionClient};
use argus_core::{AppConfig, ComponentOutcome};
use argus_db::ScanReportRow;
use argus_scanner::{Detector, Scanner};

/// Scans every active page, or only `page` when given.
///
/// # Errors
///
/// Returns an error if the adapters cannot be built, the page is unknown or
/// inactive, or a report cannot be persisted.
pub(crate) async fn run_scan(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    page: Option<&str>,
) -> anyhow::Result<()> {
    let scanner = Scanner::from_app_config(config, pool.clone())
        .map_err(|e| anyhow::anyhow!("failed to build scanner: {e}"))?;

    if let Some(page_name) = page {
        match scanner.scan_page_by_name(page_name).await? {
            Some(report) => print_report_line(&report),
            None => println!("{page_name}: no scannable components; no report written"),
        }
        return Ok(());
    }

    let summary = scanner.run_exclusive().await?;
    println!(
        "scanned {} pages: {} reports written, {} skipped, {} failed, {} anomalies",
        summary.pages_scanned,
        summary.reports_written,
        summary.pages_skipped,
        summary.pages_failed,
        summary.total_anomalies
    );
    Ok(())
}

/// Evaluates one banner and prints its anomalies; nothing is persisted.
///
/// # Errors
///
/// Returns an error if the adapters cannot be built or the input is blank.
pub(crate) async fn run_detect(
    config: &AppConfig,
    banner_url: &str,
    catalog_id: &str,
) -> anyhow::Result<()> {
    let detector = Detector::new(
        Arc::new(VisionClient::from_app_config(config)?),
        Arc::new(CatalogClient::from_app_config(config)?),
    );
    let result = detector.detect(banner_url, catalog_id).await?;

    if result.used_fallback() {
        eprintln!(
            "warning: fallback data used (signal: {}, catalog: {})",
            result.signal_origin, result.catalog_origin
        );
    }

    let brands = result.banner_signal.brands.join(", ");
    let range = result
        .banner_signal
        .effective_range()
        .map_or_else(|| "-".to_string(), |r| format!("{}-{}%", r.lower, r.upper));
    println!("banner:   {}", result.banner_url);
    println!("catalog:  {}", result.catalog_id);
    println!("brands:   {brands}");
    println!("discount: {range}");
    println!("anomalies: {}", result.total_anomalies);

    if !result.anomalies.is_empty() {
        println!();
        println!("{:<14}{:<20}{:<10}REASONS", "ITEM", "BRAND", "DISCOUNT");
        for anomaly in &result.anomalies {
            println!(
                "{:<14}{:<20}{:<10}{}",
                anomaly.item_code,
                anomaly.brand_name,
                anomaly
                    .discount_percent
                    .map_or_else(|| "-".to_string(), |d| format!("{d}%")),
                anomaly.reasons.join("; ")
            );
        }
    }
    Ok(())
}

pub(crate) fn print_report_line(report: &ScanReportRow) {
    println!(
        "report {} for {}: status={} components={} with_anomalies={} anomalies={}",
        report.id,
        report.page_name,
        report.status,
        report.total_components,
        report.components_with_anomalies,
        report.total_anomalies
    );
    if report.used_fallback_document() {
        println!("  note: CMS was unreachable; scanned the built-in fallback page document");
    }
    if let Some(message) = &report.error_message {
        println!("  error: {message}");
    }
}

/// Short description of a stored component outcome for tabular output.
pub(crate) fn describe_outcome(outcome: ComponentOutcome<'_>) -> String {
    match outcome {
        ComponentOutcome::Detected(result) => format!("{} anomalies", result.total_anomalies),
        ComponentOutcome::Failed(error) => format!("failed: {error}"),
    }
}
