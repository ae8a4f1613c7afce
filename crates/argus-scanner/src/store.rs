use argus_db::{DbError, NewScanReport, PageConfigRow, ScanReportRow};
use async_trait::async_trait;
use sqlx::PgPool;

/// Page configurations read and reports written by the orchestrator.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Active pages in declaration order.
    async fn active_pages(&self) -> Result<Vec<PageConfigRow>, DbError>;

    async fn page_by_name(&self, page_name: &str) -> Result<Option<PageConfigRow>, DbError>;

    async fn save_report(&self, report: &NewScanReport) -> Result<ScanReportRow, DbError>;
}

/// [`ScanStore`] over the Postgres tables.
#[derive(Clone)]
pub struct PgScanStore {
    pool: PgPool,
}

impl PgScanStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn active_pages(&self) -> Result<Vec<PageConfigRow>, DbError> {
        argus_db::list_active_page_configs(&self.pool).await
    }

    async fn page_by_name(&self, page_name: &str) -> Result<Option<PageConfigRow>, DbError> {
        argus_db::get_page_config_by_name(&self.pool, page_name).await
    }

    async fn save_report(&self, report: &NewScanReport) -> Result<ScanReportRow, DbError> {
        argus_db::insert_scan_report(&self.pool, report).await
    }
}
