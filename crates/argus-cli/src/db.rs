//! `db` sub-command handlers.

use std::path::Path;

/// # Errors
///
/// Returns an error if the database cannot be reached.
pub(crate) async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    argus_db::ping(pool).await?;
    println!("database: ok");
    Ok(())
}

/// # Errors
///
/// Returns an error if a migration fails to apply.
pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = argus_db::run_migrations(pool).await?;
    println!("migrations: {applied} applied");
    Ok(())
}

/// Loads and validates the pages file, then upserts every entry by name.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or the upsert fails.
/// Nothing is written when validation fails.
pub(crate) async fn run_seed(pool: &sqlx::PgPool, pages_path: &Path) -> anyhow::Result<()> {
    let pages = argus_core::load_pages(pages_path)?;
    tracing::info!(path = %pages_path.display(), pages = pages.pages.len(), "loaded pages file");
    let seeded = argus_db::seed_pages(pool, &pages.pages).await?;
    println!("seeded {seeded} pages from {}", pages_path.display());
    Ok(())
}
