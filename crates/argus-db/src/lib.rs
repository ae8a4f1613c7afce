use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

/// Migrations live at the workspace root, two levels above this crate.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Sizing for the Postgres pool shared by the scanner and the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &argus_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }

    fn acquire_timeout(self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("a page named '{0}' already exists")]
    DuplicatePageName(String),
    #[error("invalid stored value in {column}: {reason}")]
    InvalidStoredValue { column: &'static str, reason: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens the report store pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] when no connection can be made within the acquire
/// timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(database_url)
        .await
}

/// Successful rows in `_sqlx_migrations`, or zero before the table exists.
async fn applied_migration_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Applies pending migrations and reports how many were new.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migration_count(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migration_count(pool).await;

    Ok(usize::try_from(after.saturating_sub(before)).unwrap_or(0))
}

/// Round-trips a trivial query to prove the pool can reach Postgres.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// [`ping`] with the failure lifted into [`DbError`] for callers that only
/// speak the store's error type.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    Ok(ping(pool).await?)
}

/// Maps a unique-constraint violation on `page_name` to a typed error.
fn map_page_name_conflict(err: sqlx::Error, page_name: &str) -> DbError {
    let is_unique_violation = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if is_unique_violation {
        DbError::DuplicatePageName(page_name.to_string())
    } else {
        DbError::Sqlx(err)
    }
}


pub mod page_configs;
pub mod scan_reports;
pub mod seed;

pub use page_configs::{
    create_page_config, delete_page_config, get_page_config, get_page_config_by_name,
    list_active_page_configs, list_page_configs, toggle_page_config, update_page_config,
    PageConfigRow,
};
pub use scan_reports::{
    count_scan_reports, count_scan_reports_since, delete_scan_reports_before, get_scan_report,
    insert_scan_report, list_scan_reports, list_scan_reports_for_page, list_scan_reports_since,
    list_scanned_page_names, sum_total_anomalies, NewScanReport, ScanReportRow,
};
pub use seed::seed_pages;
