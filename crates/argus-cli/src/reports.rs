//! Scan report command handlers.
//!
//! Read-only apart from `prune`, which deletes whole reports past the
//! retention window.

use chrono::{Duration, Utc};
use clap::Subcommand;

use crate::scan::{describe_outcome, print_report_line};

/// Sub-commands available under `reports`.
#[derive(Debug, Subcommand)]
pub enum ReportsCommands {
    /// List reports, newest first
    List {
        /// Only reports for this page
        #[arg(long)]
        page: Option<String>,
        /// Maximum number of reports to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Show one report and its component results
    Show {
        /// Report id
        id: i64,
    },
    /// Totals across all stored reports
    Summary,
    /// Delete reports older than the given number of days
    Prune {
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        days: i64,
    },
}

/// # Errors
///
/// Returns an error if the report does not exist or a query fails.
pub(crate) async fn run(pool: &sqlx::PgPool, command: ReportsCommands) -> anyhow::Result<()> {
    match command {
        ReportsCommands::List { page, limit } => run_list(pool, page.as_deref(), limit).await,
        ReportsCommands::Show { id } => run_show(pool, id).await,
        ReportsCommands::Summary => run_summary(pool).await,
        ReportsCommands::Prune { days } => {
            let cutoff = Utc::now() - Duration::days(days);
            let deleted = argus_db::delete_scan_reports_before(pool, cutoff).await?;
            println!("pruned {deleted} reports older than {days} days");
            Ok(())
        }
    }
}

async fn run_list(pool: &sqlx::PgPool, page: Option<&str>, limit: i64) -> anyhow::Result<()> {
    let limit = Some(limit.max(1));
    let reports = match page {
        Some(page) => argus_db::list_scan_reports_for_page(pool, page, limit).await?,
        None => argus_db::list_scan_reports(pool, limit).await?,
    };

    if reports.is_empty() {
        println!("no reports found; run `scan` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<22}{:<24}{:<11}{:<12}ANOMALIES",
        "ID", "SCANNED", "PAGE", "STATUS", "COMPONENTS"
    );
    for report in &reports {
        println!(
            "{:<8}{:<22}{:<24}{:<11}{:<12}{}",
            report.id,
            report.scan_time.format("%Y-%m-%d %H:%M:%S"),
            report.page_name,
            report.status,
            report.total_components,
            report.total_anomalies
        );
    }
    Ok(())
}

async fn run_show(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let report = argus_db::get_scan_report(pool, id)
        .await
        .map_err(|e| match e {
            argus_db::DbError::NotFound => anyhow::anyhow!("report {id} not found"),
            other => other.into(),
        })?;

    print_report_line(&report);
    println!("scanned at {}", report.scan_time.to_rfc3339());

    let components = report.component_results();
    if components.is_empty() {
        return Ok(());
    }

    println!();
    println!("{:<4}{:<12}{:<48}OUTCOME", "#", "CATALOG", "BANNER");
    for (i, entry) in components.iter().enumerate() {
        println!(
            "{:<4}{:<12}{:<48}{}",
            i + 1,
            entry.component.catalog_id,
            entry.component.banner_url,
            describe_outcome(entry.outcome())
        );
    }
    Ok(())
}

async fn run_summary(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let total = argus_db::count_scan_reports(pool).await?;
    let anomalies = argus_db::sum_total_anomalies(pool).await?;
    let last_day = argus_db::count_scan_reports_since(pool, Utc::now() - Duration::hours(24)).await?;
    let pages = argus_db::list_scanned_page_names(pool).await?;

    println!("reports:        {total}");
    println!("last 24h:       {last_day}");
    println!("anomalies:      {anomalies}");
    println!("pages scanned:  {}", pages.join(", "));
    Ok(())
}
