//! Orchestrator tests against in-memory collaborators.
//!
//! No network or database: signal, catalog and page sources are scripted
//! doubles and reports land in a `Vec` behind a mutex.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use argus_clients::AdapterError;
use argus_core::{
    BannerSignal, CatalogItem, ComponentOutcome, DataOrigin, DiscountRange, Fetched,
};
use argus_db::{DbError, NewScanReport, PageConfigRow, ScanReportRow};
use argus_scanner::{
    CatalogSource, DetectError, Detector, PageSource, ScanError, ScanStore, Scanner, SignalSource,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

struct FixedSignals;

#[async_trait]
impl SignalSource for FixedSignals {
    async fn fetch_signal(&self, _banner_url: &str) -> Result<Fetched<BannerSignal>, AdapterError> {
        Ok(Fetched::live(BannerSignal::new(
            vec!["Nike".to_string(), "Adidas".to_string()],
            Some(DiscountRange::new(20.0, 50.0)),
        )))
    }
}

/// Items per catalog id; ids in `failing` return a transport error.
#[derive(Default)]
struct ScriptedCatalog {
    items: HashMap<String, Vec<CatalogItem>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_items(
        &self,
        catalog_id: &str,
    ) -> Result<Fetched<Vec<CatalogItem>>, AdapterError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(catalog_id) {
            return Err(AdapterError::UnexpectedStatus {
                status: 502,
                url: format!("https://catalog.test/?curatedid={catalog_id}"),
            });
        }
        Ok(Fetched::live(
            self.items.get(catalog_id).cloned().unwrap_or_default(),
        ))
    }
}

/// Page documents per source id; unknown ids fail like a bad body.
/// With `serve_fallback`, every document is tagged as the fallback.
#[derive(Default)]
struct ScriptedPages {
    documents: HashMap<String, serde_json::Value>,
    serve_fallback: bool,
}

#[async_trait]
impl PageSource for ScriptedPages {
    async fn fetch_document(
        &self,
        cms_source_id: &str,
    ) -> Result<Fetched<serde_json::Value>, AdapterError> {
        type Wrap = fn(serde_json::Value) -> Fetched<serde_json::Value>;
        let wrap: Wrap = if self.serve_fallback {
            Fetched::fallback
        } else {
            Fetched::live
        };
        self.documents
            .get(cms_source_id)
            .cloned()
            .map(wrap)
            .ok_or_else(|| AdapterError::Deserialize {
                context: format!("CMS document {cms_source_id}"),
                source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            })
    }
}

#[derive(Default)]
struct MemoryStore {
    pages: Vec<PageConfigRow>,
    reports: Mutex<Vec<ScanReportRow>>,
    next_id: AtomicI64,
    fail_saves: bool,
}

impl MemoryStore {
    fn with_pages(pages: Vec<PageConfigRow>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn reports(&self) -> Vec<ScanReportRow> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn active_pages(&self) -> Result<Vec<PageConfigRow>, DbError> {
        Ok(self.pages.iter().filter(|p| p.active).cloned().collect())
    }

    async fn page_by_name(&self, page_name: &str) -> Result<Option<PageConfigRow>, DbError> {
        Ok(self.pages.iter().find(|p| p.page_name == page_name).cloned())
    }

    async fn save_report(&self, report: &NewScanReport) -> Result<ScanReportRow, DbError> {
        if self.fail_saves {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let row = ScanReportRow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            public_id: uuid::Uuid::new_v4(),
            page_name: report.page_name.clone(),
            cms_source_id: report.cms_source_id.clone(),
            total_components: i32::try_from(report.totals.total_components).unwrap(),
            components_with_anomalies: i32::try_from(report.totals.components_with_anomalies)
                .unwrap(),
            total_anomalies: i32::try_from(report.totals.total_anomalies).unwrap(),
            component_results: serde_json::to_value(&report.component_results).unwrap(),
            status: report.status.as_str().to_string(),
            error_message: report.error_message.clone(),
            document_origin: report.document_origin.as_str().to_string(),
            scan_time: report.scan_time,
        };
        self.reports.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn page(id: i64, name: &str, active: bool) -> PageConfigRow {
    let now = Utc::now();
    PageConfigRow {
        id,
        page_name: name.to_string(),
        cms_source_id: format!("{name}-source"),
        active,
        created_at: now,
        updated_at: now,
    }
}

fn three_banner_document() -> serde_json::Value {
    json!({
        "slots": [ { "component": { "name": "hero", "banners": [
            { "imageUrl": "https://cdn.test/1.jpg", "hotspots": [ { "targetId": "1" } ] },
            { "imageUrl": "https://cdn.test/2.jpg", "hotspots": [ { "targetId": "2" } ] },
            { "imageUrl": "https://cdn.test/3.jpg", "hotspots": [ { "targetId": "3" } ] }
        ] } } ]
    })
}

fn catalog_with_failure_on_2() -> ScriptedCatalog {
    let mut items = HashMap::new();
    // One anomaly: Zara at 60 breaks both rules.
    items.insert(
        "1".to_string(),
        vec![
            CatalogItem::new("P1", Some("Zara"), Some(60.0)),
            CatalogItem::new("P3", Some("Adidas"), Some(35.0)),
        ],
    );
    // Two anomalies.
    items.insert(
        "3".to_string(),
        vec![
            CatalogItem::new("P4", Some("Nike"), Some(10.0)),
            CatalogItem::new("P5", Some("Calvin Klein"), Some(30.0)),
        ],
    );
    ScriptedCatalog {
        items,
        failing: HashSet::from(["2".to_string()]),
        delay: None,
    }
}

fn scanner_with(
    catalog: ScriptedCatalog,
    pages: ScriptedPages,
    store: Arc<MemoryStore>,
    concurrency: usize,
) -> Scanner {
    let detector = Detector::new(Arc::new(FixedSignals), Arc::new(catalog));
    Scanner::new(detector, Arc::new(pages), store, concurrency)
}

fn pages_for(entries: &[(&str, serde_json::Value)]) -> ScriptedPages {
    ScriptedPages {
        documents: entries
            .iter()
            .map(|(source, doc)| ((*source).to_string(), doc.clone()))
            .collect(),
        serve_fallback: false,
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn detect_flags_mismatches_and_tags_origins() {
    let detector = Detector::new(Arc::new(FixedSignals), Arc::new(catalog_with_failure_on_2()));

    let result = detector
        .detect("https://cdn.test/1.jpg", "1")
        .await
        .expect("detect");

    assert_eq!(result.total_anomalies, 1);
    assert_eq!(result.anomalies[0].item_code, "P1");
    assert_eq!(result.anomalies[0].reasons.len(), 2);
    assert_eq!(result.status, "success");
    assert_eq!(result.signal_origin, DataOrigin::Live);
    assert_eq!(result.catalog_origin, DataOrigin::Live);
}

#[tokio::test]
async fn detect_rejects_blank_inputs_and_surfaces_source_errors() {
    let detector = Detector::new(Arc::new(FixedSignals), Arc::new(catalog_with_failure_on_2()));

    assert!(matches!(
        detector.detect("  ", "1").await,
        Err(DetectError::InvalidInput(_))
    ));
    assert!(matches!(
        detector.detect("https://cdn.test/x.jpg", "").await,
        Err(DetectError::InvalidInput(_))
    ));
    assert!(matches!(
        detector.detect("https://cdn.test/2.jpg", "2").await,
        Err(DetectError::Catalog(_))
    ));
}

// ---------------------------------------------------------------------------
// Page scans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failing_component_does_not_blank_the_page() {
    let store = Arc::new(MemoryStore::default());
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[("home-source", three_banner_document())]),
        Arc::clone(&store),
        1,
    );

    let row = scanner
        .scan_page(&page(1, "home", true))
        .await
        .expect("scan")
        .expect("report written");

    assert_eq!(row.status, "completed");
    assert_eq!(row.total_components, 3);
    assert_eq!(row.components_with_anomalies, 2);
    assert_eq!(row.total_anomalies, 3);

    let results = row.component_results();
    assert_eq!(results.len(), 3);
    let errors: Vec<&str> = results
        .iter()
        .filter_map(|r| match r.outcome() {
            ComponentOutcome::Failed(e) => Some(e),
            ComponentOutcome::Detected(_) => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("502"), "error should carry the cause: {}", errors[0]);
    assert_eq!(results[1].component.catalog_id, "2");
    assert!(results[1].error.is_some());
}

#[tokio::test]
async fn report_from_fallback_document_is_flagged() {
    let store = Arc::new(MemoryStore::default());
    let mut pages = pages_for(&[("home-source", three_banner_document())]);
    pages.serve_fallback = true;
    let scanner = scanner_with(catalog_with_failure_on_2(), pages, Arc::clone(&store), 1);

    let row = scanner
        .scan_page(&page(1, "home", true))
        .await
        .expect("scan")
        .expect("report written");

    assert_eq!(row.status, "completed");
    assert_eq!(row.document_origin, "fallback");
    assert!(row.used_fallback_document());
    assert_eq!(store.reports()[0].document_origin, "fallback");
}

#[tokio::test]
async fn report_from_live_document_is_not_flagged() {
    let store = Arc::new(MemoryStore::default());
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[("home-source", three_banner_document())]),
        Arc::clone(&store),
        1,
    );

    let row = scanner
        .scan_page(&page(1, "home", true))
        .await
        .expect("scan")
        .expect("report written");

    assert!(!row.used_fallback_document());
}

#[tokio::test]
async fn concurrent_fan_out_keeps_order_and_totals() {
    let store = Arc::new(MemoryStore::default());
    let mut catalog = catalog_with_failure_on_2();
    catalog.delay = Some(Duration::from_millis(5));
    let scanner = scanner_with(
        catalog,
        pages_for(&[("home-source", three_banner_document())]),
        Arc::clone(&store),
        3,
    );

    let row = scanner
        .scan_page(&page(1, "home", true))
        .await
        .expect("scan")
        .expect("report written");

    let ids: Vec<String> = row
        .component_results()
        .into_iter()
        .map(|r| r.component.catalog_id)
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(row.total_anomalies, 3);
    assert_eq!(row.components_with_anomalies, 2);
}

#[tokio::test]
async fn page_with_no_components_is_skipped_without_report() {
    let store = Arc::new(MemoryStore::default());
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[("empty-source", json!({ "slots": [] }))]),
        Arc::clone(&store),
        1,
    );

    let outcome = scanner.scan_page(&page(1, "empty", true)).await.expect("scan");

    assert!(outcome.is_none());
    assert!(store.reports().is_empty());
}

#[tokio::test]
async fn malformed_document_writes_error_report() {
    let store = Arc::new(MemoryStore::default());
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[("broken-source", json!({ "slots": "nope" }))]),
        Arc::clone(&store),
        1,
    );

    let row = scanner
        .scan_page(&page(1, "broken", true))
        .await
        .expect("scan")
        .expect("error report written");

    assert_eq!(row.status, "error");
    assert_eq!(row.total_components, 0);
    assert_eq!(row.total_anomalies, 0);
    assert!(row
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("malformed")));
}

#[tokio::test]
async fn unreadable_page_document_writes_error_report() {
    let store = Arc::new(MemoryStore::default());
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        ScriptedPages::default(),
        Arc::clone(&store),
        1,
    );

    let row = scanner
        .scan_page(&page(1, "missing", true))
        .await
        .expect("scan")
        .expect("error report written");

    assert_eq!(row.status, "error");
    assert!(row
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("failed to fetch page document")));
}

#[tokio::test]
async fn persistence_failure_is_fatal_to_the_page_scan() {
    let store = Arc::new(MemoryStore {
        fail_saves: true,
        ..MemoryStore::default()
    });
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[("home-source", three_banner_document())]),
        store,
        1,
    );

    assert!(matches!(
        scanner.scan_page(&page(1, "home", true)).await,
        Err(ScanError::Persistence(_))
    ));
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scan_all_active_pages_continues_past_failures() {
    let store = Arc::new(MemoryStore::with_pages(vec![
        page(1, "home", true),
        page(2, "broken", true),
        page(3, "empty", true),
        page(4, "retired", false),
        page(5, "sale", true),
    ]));
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[
            ("home-source", three_banner_document()),
            ("broken-source", json!({ "page": "unknown layout" })),
            ("empty-source", json!({ "slots": [] })),
            ("sale-source", three_banner_document()),
        ]),
        Arc::clone(&store),
        2,
    );

    let summary = scanner.scan_all_active_pages().await.expect("run");

    assert_eq!(summary.pages_scanned, 4);
    assert_eq!(summary.reports_written, 3);
    assert_eq!(summary.pages_skipped, 1);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.total_anomalies, 6);

    let pages: Vec<String> = store.reports().into_iter().map(|r| r.page_name).collect();
    assert_eq!(pages, vec!["home", "broken", "sale"]);
}

#[tokio::test]
async fn scan_page_by_name_requires_an_active_page() {
    let store = Arc::new(MemoryStore::with_pages(vec![
        page(1, "home", true),
        page(2, "retired", false),
    ]));
    let scanner = scanner_with(
        catalog_with_failure_on_2(),
        pages_for(&[("home-source", three_banner_document())]),
        Arc::clone(&store),
        1,
    );

    let row = scanner
        .scan_page_by_name("home")
        .await
        .expect("scan")
        .expect("report");
    assert_eq!(row.page_name, "home");

    assert!(matches!(
        scanner.scan_page_by_name("retired").await,
        Err(ScanError::PageNotFound(name)) if name == "retired"
    ));
    assert!(matches!(
        scanner.scan_page_by_name("nope").await,
        Err(ScanError::PageNotFound(_))
    ));
}

#[tokio::test]
async fn second_guarded_run_is_rejected_while_first_is_in_flight() {
    let store = Arc::new(MemoryStore::with_pages(vec![page(1, "home", true)]));
    let mut catalog = catalog_with_failure_on_2();
    catalog.delay = Some(Duration::from_millis(200));
    let scanner = Arc::new(scanner_with(
        catalog,
        pages_for(&[("home-source", three_banner_document())]),
        Arc::clone(&store),
        1,
    ));

    let first = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.run_exclusive().await }
    });

    // Wait for the first run to take the guard.
    for _ in 0..100 {
        if scanner.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(scanner.is_running());

    assert!(matches!(
        scanner.run_exclusive().await,
        Err(ScanError::AlreadyRunning)
    ));
    assert!(matches!(
        scanner.scan_page_by_name("home").await,
        Err(ScanError::AlreadyRunning)
    ));

    let summary = first.await.expect("join").expect("first run");
    assert_eq!(summary.reports_written, 1);
    assert!(!scanner.is_running());
    assert!(scanner.run_exclusive().await.is_ok());
}
