//! Offline unit tests for argus-db pool configuration and row types.
//! These tests do not require a live database connection.

use argus_core::{AppConfig, Environment, ScanStatus, ScanTotals};
use argus_db::{NewScanReport, PageConfigRow, PoolConfig, ScanReportRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        pages_path: PathBuf::from("./config/pages.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        vision_api_key: None,
        vision_api_url: "https://api.anthropic.com".to_string(),
        vision_model: "claude-3-5-sonnet-20241022".to_string(),
        catalog_api_url: "https://catalog.example.com/search".to_string(),
        cms_base_url: None,
        http_user_agent: "ua".to_string(),
        vision_timeout_secs: 60,
        catalog_timeout_secs: 30,
        cms_timeout_secs: 30,
        adapter_max_retries: 2,
        adapter_retry_backoff_ms: 500,
        cache_ttl_secs: 3600,
        cache_max_entries: 1024,
        scan_cron: "0 0 */4 * * *".to_string(),
        scan_max_concurrent_components: 1,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`PageConfigRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn page_config_row_has_expected_fields() {
    use chrono::Utc;

    let now = Utc::now();
    let row = PageConfigRow {
        id: 1_i64,
        page_name: "home".to_string(),
        cms_source_id: "home-id".to_string(),
        active: true,
        created_at: now,
        updated_at: now,
    };

    assert_eq!(row.page_name, "home");
    assert!(row.active);
}

#[test]
fn scan_report_row_has_expected_fields() {
    use chrono::Utc;

    let row = ScanReportRow {
        id: 1_i64,
        public_id: uuid::Uuid::new_v4(),
        page_name: "home".to_string(),
        cms_source_id: "home-id".to_string(),
        total_components: 3_i32,
        components_with_anomalies: 1_i32,
        total_anomalies: 2_i32,
        component_results: serde_json::json!([]),
        status: "completed".to_string(),
        error_message: None,
        document_origin: "live".to_string(),
        scan_time: Utc::now(),
    };

    assert_eq!(row.scan_status().expect("status"), ScanStatus::Completed);
    assert!(row.component_results().is_empty());
}

#[test]
fn completed_report_derives_totals_from_results() {
    let report = NewScanReport::completed("home", "home-id", Vec::new());
    assert_eq!(report.totals, ScanTotals::default());
    assert_eq!(report.status, ScanStatus::Completed);
    assert!(report.error_message.is_none());
}
