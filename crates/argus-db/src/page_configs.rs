//! Database operations for the `page_configurations` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{map_page_name_conflict, DbError};

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `page_configurations` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PageConfigRow {
    pub id: i64,
    pub page_name: String,
    /// CMS page URL, or an id the CMS adapter resolves against its base URL.
    pub cms_source_id: String,
    /// Inactive pages keep their report history but are skipped by scans.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, page_name, cms_source_id, active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every page configuration, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_page_configs(pool: &PgPool) -> Result<Vec<PageConfigRow>, DbError> {
    let rows = sqlx::query_as::<_, PageConfigRow>(&format!(
        "SELECT {COLUMNS} FROM page_configurations ORDER BY page_name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns active page configurations in declaration (insertion) order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_page_configs(pool: &PgPool) -> Result<Vec<PageConfigRow>, DbError> {
    let rows = sqlx::query_as::<_, PageConfigRow>(&format!(
        "SELECT {COLUMNS} FROM page_configurations WHERE active ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a page configuration by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the id, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_page_config(pool: &PgPool, id: i64) -> Result<PageConfigRow, DbError> {
    sqlx::query_as::<_, PageConfigRow>(&format!(
        "SELECT {COLUMNS} FROM page_configurations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fetches a page configuration by its unique name, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_page_config_by_name(
    pool: &PgPool,
    page_name: &str,
) -> Result<Option<PageConfigRow>, DbError> {
    let row = sqlx::query_as::<_, PageConfigRow>(&format!(
        "SELECT {COLUMNS} FROM page_configurations WHERE page_name = $1"
    ))
    .bind(page_name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Creates an active page configuration.
///
/// # Errors
///
/// Returns [`DbError::DuplicatePageName`] if the name is taken, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_page_config(
    pool: &PgPool,
    page_name: &str,
    cms_source_id: &str,
) -> Result<PageConfigRow, DbError> {
    sqlx::query_as::<_, PageConfigRow>(&format!(
        "INSERT INTO page_configurations (page_name, cms_source_id) \
         VALUES ($1, $2) \
         RETURNING {COLUMNS}"
    ))
    .bind(page_name)
    .bind(cms_source_id)
    .fetch_one(pool)
    .await
    .map_err(|e| map_page_name_conflict(e, page_name))
}

/// Replaces name, source and active flag of an existing page, bumping
/// `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the id,
/// [`DbError::DuplicatePageName`] if the new name belongs to another page,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn update_page_config(
    pool: &PgPool,
    id: i64,
    page_name: &str,
    cms_source_id: &str,
    active: bool,
) -> Result<PageConfigRow, DbError> {
    sqlx::query_as::<_, PageConfigRow>(&format!(
        "UPDATE page_configurations \
         SET page_name = $1, cms_source_id = $2, active = $3, updated_at = NOW() \
         WHERE id = $4 \
         RETURNING {COLUMNS}"
    ))
    .bind(page_name)
    .bind(cms_source_id)
    .bind(active)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| map_page_name_conflict(e, page_name))?
    .ok_or(DbError::NotFound)
}

/// Flips the `active` flag of a page and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the id, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn toggle_page_config(pool: &PgPool, id: i64) -> Result<PageConfigRow, DbError> {
    let row = sqlx::query_as::<_, PageConfigRow>(&format!(
        "UPDATE page_configurations \
         SET active = NOT active, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    tracing::info!(page = %row.page_name, active = row.active, "page configuration toggled");
    Ok(row)
}

/// Deletes a page configuration. Its scan reports are kept.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the id, or [`DbError::Sqlx`]
/// if the delete fails.
pub async fn delete_page_config(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM page_configurations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    tracing::info!(id, "page configuration deleted");
    Ok(())
}
