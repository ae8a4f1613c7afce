//! Page configuration handlers: list, create, read, update, toggle, delete.

use argus_db::PageConfigRow;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreatePageRequest {
    #[serde(default)]
    page_name: String,
    #[serde(default)]
    cms_source_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdatePageRequest {
    #[serde(default)]
    page_name: String,
    #[serde(default)]
    cms_source_id: String,
    active: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct PageItem {
    id: i64,
    page_name: String,
    cms_source_id: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PageConfigRow> for PageItem {
    fn from(row: PageConfigRow) -> Self {
        Self {
            id: row.id,
            page_name: row.page_name,
            cms_source_id: row.cms_source_id,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Trims both fields and rejects blanks.
fn validate_page_fields<'a>(
    req_id: &str,
    page_name: &'a str,
    cms_source_id: &'a str,
) -> Result<(&'a str, &'a str), ApiError> {
    let page_name = page_name.trim();
    let cms_source_id = cms_source_id.trim();
    if page_name.is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "page_name must not be blank",
        ));
    }
    if cms_source_id.is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "cms_source_id must not be blank",
        ));
    }
    Ok((page_name, cms_source_id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/pages
pub(super) async fn list_pages(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<PageItem>>>, ApiError> {
    let rows = argus_db::list_page_configs(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(PageItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/pages
pub(super) async fn create_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreatePageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PageItem>>), ApiError> {
    let rid = &req_id.0;
    let (page_name, cms_source_id) = validate_page_fields(rid, &body.page_name, &body.cms_source_id)?;

    let row = argus_db::create_page_config(&state.pool, page_name, cms_source_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(page_id = row.id, page = %row.page_name, "page configuration created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(PageItem::from(row), req_id.0)),
    ))
}

/// GET /api/v1/pages/:id
pub(super) async fn get_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PageItem>>, ApiError> {
    let row = argus_db::get_page_config(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(PageItem::from(row), req_id.0)))
}

/// PUT /api/v1/pages/:id
pub(super) async fn update_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePageRequest>,
) -> Result<Json<ApiResponse<PageItem>>, ApiError> {
    let rid = &req_id.0;
    let (page_name, cms_source_id) = validate_page_fields(rid, &body.page_name, &body.cms_source_id)?;

    let row = argus_db::update_page_config(&state.pool, id, page_name, cms_source_id, body.active)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(page_id = row.id, page = %row.page_name, active = row.active, "page configuration updated");
    Ok(Json(ApiResponse::new(PageItem::from(row), req_id.0)))
}

/// POST /api/v1/pages/:id/toggle
pub(super) async fn toggle_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PageItem>>, ApiError> {
    let row = argus_db::toggle_page_config(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(page_id = row.id, active = row.active, "page configuration toggled");
    Ok(Json(ApiResponse::new(PageItem::from(row), req_id.0)))
}

/// DELETE /api/v1/pages/:id
///
/// Reports already written for the page are kept.
pub(super) async fn delete_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    argus_db::delete_page_config(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(page_id = id, "page configuration deleted");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::super::test_support::{app, send};

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_then_list_pages(pool: sqlx::PgPool) {
        let (status, json) = send(
            app(pool.clone()),
            Method::POST,
            "/api/v1/pages",
            Some(json!({ "page_name": "  home ", "cms_source_id": "home-page" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["page_name"], "home");
        assert_eq!(json["data"]["active"], true);

        let (status, json) = send(app(pool), Method::GET, "/api/v1/pages", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .filter_map(|p| p["page_name"].as_str())
            .collect();
        assert_eq!(names, vec!["home"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_page_rejects_blank_fields(pool: sqlx::PgPool) {
        let (status, json) = send(
            app(pool),
            Method::POST,
            "/api/v1/pages",
            Some(json!({ "page_name": "home", "cms_source_id": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_page_with_duplicate_name_conflicts(pool: sqlx::PgPool) {
        argus_db::create_page_config(&pool, "home", "home-page")
            .await
            .expect("seed page");

        let (status, json) = send(
            app(pool),
            Method::POST,
            "/api/v1/pages",
            Some(json!({ "page_name": "home", "cms_source_id": "other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "conflict");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_page_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let (status, json) = send(app(pool), Method::GET, "/api/v1/pages/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn update_toggle_and_delete_page(pool: sqlx::PgPool) {
        let page = argus_db::create_page_config(&pool, "home", "home-page")
            .await
            .expect("seed page");
        let uri = format!("/api/v1/pages/{}", page.id);

        let (status, json) = send(
            app(pool.clone()),
            Method::PUT,
            &uri,
            Some(json!({ "page_name": "landing", "cms_source_id": "landing-page", "active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["page_name"], "landing");
        assert_eq!(json["data"]["active"], false);

        let (status, json) = send(
            app(pool.clone()),
            Method::POST,
            &format!("{uri}/toggle"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["active"], true);

        let (status, json) = send(app(pool.clone()), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["deleted"], true);

        let (status, _) = send(app(pool), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
