use argus_core::PageSeed;
use sqlx::PgPool;

use crate::DbError;

/// Upsert page configurations from `config/pages.yaml`, keyed by page name.
///
/// Existing pages get their source and active flag overwritten. Pages in
/// the database but absent from the file are left alone.
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// Returns the number of pages processed (inserted or updated).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_pages(pool: &PgPool, pages: &[PageSeed]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for page in pages {
        sqlx::query(
            "INSERT INTO page_configurations (page_name, cms_source_id, active) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (page_name) DO UPDATE SET \
                 cms_source_id = EXCLUDED.cms_source_id, \
                 active = EXCLUDED.active, \
                 updated_at = NOW()",
        )
        .bind(page.name.trim())
        .bind(page.cms_source_id.trim())
        .bind(page.active)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::info!(count, "seeded page configurations");
    Ok(count)
}
