//! Background job scheduler.
//!
//! Runs the recurring scan of all active pages at startup-configured cron
//! times.

use std::sync::Arc;

use argus_scanner::{ScanError, Scanner};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it stops the scan job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `cron` is not a valid expression, or the scheduler fails to start.
pub async fn build_scheduler(
    scanner: Arc<Scanner>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_scan_job(&scheduler, scanner, cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Registers the recurring scan of every active page.
///
/// A tick that fires while a manual scan holds the guard is skipped.
async fn register_scan_job(
    scheduler: &JobScheduler,
    scanner: Arc<Scanner>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let scanner = Arc::clone(&scanner);

        Box::pin(async move {
            tracing::info!("scheduler: starting scheduled page scan");
            run_scan_job(&scanner).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: page scan job registered");
    Ok(())
}

async fn run_scan_job(scanner: &Scanner) {
    match scanner.run_exclusive().await {
        Ok(summary) => tracing::info!(
            pages_scanned = summary.pages_scanned,
            reports_written = summary.reports_written,
            pages_failed = summary.pages_failed,
            total_anomalies = summary.total_anomalies,
            "scheduler: scheduled page scan complete"
        ),
        Err(ScanError::AlreadyRunning) => {
            tracing::warn!("scheduler: a scan is already running; skipping this tick");
        }
        Err(e) => tracing::error!(error = %e, "scheduler: scheduled page scan failed"),
    }
}
