//! Scan orchestration: page → components → detection → one report.
//!
//! Failures are contained at the smallest scope. A failing component is
//! recorded inside a `completed` report, a failing page is logged and the
//! run moves on, and only store failures abort a run.

use std::sync::Arc;
use std::time::Duration;

use argus_clients::{CatalogClient, CmsClient, VisionClient};
use argus_core::{AppConfig, ComponentResult, ScanComponent, ScanStatus};
use argus_db::{NewScanReport, PageConfigRow, ScanReportRow};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::cached::{CachedCatalogSource, CachedSignalSource};
use crate::detector::Detector;
use crate::error::ScanError;
use crate::sources::PageSource;
use crate::store::{PgScanStore, ScanStore};

/// Counts for one pass over all active pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub pages_scanned: usize,
    pub reports_written: usize,
    /// Pages that resolved to zero components; no report is written.
    pub pages_skipped: usize,
    /// Pages whose report has `status = error`, or whose scan could not be
    /// persisted.
    pub pages_failed: usize,
    pub total_anomalies: i64,
}

pub struct Scanner {
    detector: Detector,
    pages: Arc<dyn PageSource>,
    store: Arc<dyn ScanStore>,
    max_concurrent_components: usize,
    running: Mutex<()>,
}

impl Scanner {
    pub fn new(
        detector: Detector,
        pages: Arc<dyn PageSource>,
        store: Arc<dyn ScanStore>,
        max_concurrent_components: usize,
    ) -> Self {
        Self {
            detector,
            pages,
            store,
            max_concurrent_components: max_concurrent_components.max(1),
            running: Mutex::new(()),
        }
    }

    /// Wires the HTTP adapters, their caches and the Postgres store.
    ///
    /// # Errors
    ///
    /// Returns [`argus_clients::AdapterError::Http`] if an HTTP client cannot
    /// be built.
    pub fn from_app_config(
        config: &AppConfig,
        pool: PgPool,
    ) -> Result<Self, argus_clients::AdapterError> {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let signals = CachedSignalSource::new(
            VisionClient::from_app_config(config)?,
            ttl,
            config.cache_max_entries,
        );
        let catalog = CachedCatalogSource::new(
            CatalogClient::from_app_config(config)?,
            ttl,
            config.cache_max_entries,
        );
        let detector = Detector::new(Arc::new(signals), Arc::new(catalog));

        Ok(Self::new(
            detector,
            Arc::new(CmsClient::from_app_config(config)?),
            Arc::new(PgScanStore::new(pool)),
            config.scan_max_concurrent_components,
        ))
    }

    #[must_use]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Scans one page and persists its report.
    ///
    /// Returns `Ok(None)` when the page resolves to zero components; nothing
    /// is written in that case. A page document that cannot be fetched or
    /// resolved produces a `status = error` report.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Persistence`] if the report cannot be saved.
    pub async fn scan_page(&self, page: &PageConfigRow) -> Result<Option<ScanReportRow>, ScanError> {
        let page_name = page.page_name.as_str();
        let source = page.cms_source_id.as_str();

        let (document, document_origin) = match self.pages.fetch_document(source).await {
            Ok(fetched) => {
                if fetched.is_fallback() {
                    tracing::warn!(page = %page_name, "scanning fallback page document");
                }
                (fetched.value, fetched.origin)
            }
            Err(e) => {
                tracing::error!(page = %page_name, error = %e, "page document fetch failed");
                return self
                    .save_error_report(page, &format!("failed to fetch page document: {e}"))
                    .await
                    .map(Some);
            }
        };

        let components = match argus_core::resolve(&document) {
            Ok(components) => components,
            Err(e) => {
                tracing::error!(page = %page_name, error = %e, "page document could not be resolved");
                return self.save_error_report(page, &e.to_string()).await.map(Some);
            }
        };

        if components.is_empty() {
            tracing::info!(page = %page_name, "page has no scannable components, skipping");
            return Ok(None);
        }

        tracing::info!(page = %page_name, components = components.len(), "scanning page");

        let results: Vec<ComponentResult> = stream::iter(components)
            .map(|component| self.scan_component(page_name, component))
            .buffered(self.max_concurrent_components)
            .collect()
            .await;

        let report = NewScanReport::completed(page_name, source, results)
            .with_document_origin(document_origin);
        let failed = argus_core::ScanTotals::failed_components(&report.component_results);
        let row = self.store.save_report(&report).await?;

        tracing::info!(
            page = %page_name,
            report_id = row.id,
            total_components = row.total_components,
            components_with_anomalies = row.components_with_anomalies,
            total_anomalies = row.total_anomalies,
            failed_components = failed,
            document_origin = %document_origin,
            "page scan completed"
        );
        Ok(Some(row))
    }

    /// Scans every active page, one at a time, in declaration order.
    ///
    /// A page that fails is logged and counted; the remaining pages are
    /// still scanned.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Persistence`] if the active pages cannot be listed.
    pub async fn scan_all_active_pages(&self) -> Result<ScanSummary, ScanError> {
        let pages = self.store.active_pages().await?;
        tracing::info!(pages = pages.len(), "starting scan of active pages");

        let mut summary = ScanSummary::default();
        for page in &pages {
            summary.pages_scanned += 1;
            match self.scan_page(page).await {
                Ok(Some(row)) => {
                    summary.reports_written += 1;
                    summary.total_anomalies += i64::from(row.total_anomalies);
                    if row.status == ScanStatus::Error.as_str() {
                        summary.pages_failed += 1;
                    }
                }
                Ok(None) => summary.pages_skipped += 1,
                Err(e) => {
                    summary.pages_failed += 1;
                    tracing::error!(page = %page.page_name, error = %e, "page scan failed");
                }
            }
        }

        tracing::info!(
            pages_scanned = summary.pages_scanned,
            reports_written = summary.reports_written,
            pages_skipped = summary.pages_skipped,
            pages_failed = summary.pages_failed,
            total_anomalies = summary.total_anomalies,
            "scan of active pages finished"
        );
        Ok(summary)
    }

    /// [`Self::scan_all_active_pages`] behind the single-flight guard.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::AlreadyRunning`] if another guarded scan is in
    /// progress, otherwise as [`Self::scan_all_active_pages`].
    pub async fn run_exclusive(&self) -> Result<ScanSummary, ScanError> {
        let _guard = self.running.try_lock().map_err(|_| ScanError::AlreadyRunning)?;
        self.scan_all_active_pages().await
    }

    /// Scans one active page by name, behind the single-flight guard.
    ///
    /// # Errors
    ///
    /// - [`ScanError::AlreadyRunning`] if another guarded scan is in progress.
    /// - [`ScanError::PageNotFound`] if no active page has the name.
    /// - [`ScanError::Persistence`] on store failure.
    pub async fn scan_page_by_name(
        &self,
        page_name: &str,
    ) -> Result<Option<ScanReportRow>, ScanError> {
        let _guard = self.running.try_lock().map_err(|_| ScanError::AlreadyRunning)?;
        let page = self
            .store
            .page_by_name(page_name)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| ScanError::PageNotFound(page_name.to_string()))?;
        self.scan_page(&page).await
    }

    /// `true` while a guarded scan holds the lock.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    async fn scan_component(&self, page_name: &str, component: ScanComponent) -> ComponentResult {
        match self
            .detector
            .detect(&component.banner_url, &component.catalog_id)
            .await
        {
            Ok(result) => ComponentResult::detected(component, result),
            Err(e) => {
                tracing::warn!(
                    page = %page_name,
                    banner_url = %component.banner_url,
                    catalog_id = %component.catalog_id,
                    error = %e,
                    "component scan failed"
                );
                ComponentResult::failed(component, e.to_string())
            }
        }
    }

    async fn save_error_report(
        &self,
        page: &PageConfigRow,
        message: &str,
    ) -> Result<ScanReportRow, ScanError> {
        let report = NewScanReport::failed(&page.page_name, &page.cms_source_id, message);
        Ok(self.store.save_report(&report).await?)
    }
}
