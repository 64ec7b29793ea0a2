//! Handlers for the list-of-values tables.
//!
//! One set of handlers serves every kind. The `{kind}` path segment picks the table and the
//! permission code, so the check happens in the handler rather than in a typed extractor.

use crate::AppState;
use crate::api::handlers::ensure_matching_id;
use crate::api::models::lov::{ListLovQuery, LovCreate, LovKind, LovResponse, LovUpdate};
use crate::api::models::pagination::PagedList;
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::require_permission;
use crate::db::errors::DbError;
use crate::db::handlers::{Lovs, Repository, lov::LovFilter};
use crate::db::models::lov::{LovCreateDBRequest, LovUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{LovId, Operation};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

fn lov_not_found(kind: LovKind, id: LovId) -> Error {
    Error::NotFound {
        resource: kind.display_name().to_string(),
        id: id.to_string(),
    }
}

/// Resolve the path segment and check the caller may manage that kind
fn authorize(user: &CurrentUser, kind: &str, operation: Operation) -> Result<LovKind> {
    let kind: LovKind = kind.parse()?;
    require_permission(user, kind.resource(), operation)?;
    Ok(kind)
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Name is required".to_string(),
        });
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/lov/{kind}",
    tag = "lists of values",
    summary = "List values",
    description = "Values of one kind ordered by name.",
    responses(
        (status = 200, description = "Page of values; metadata in the Pagination header", body = Vec<LovResponse>),
        (status = 400, description = "Unknown kind"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing the permission for this kind"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("kind" = LovKind, Path, description = "List of values"),
        ListLovQuery
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_lov(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(kind): Path<String>,
    Query(query): Query<ListLovQuery>,
) -> Result<PagedList<LovResponse>> {
    let kind = authorize(&current_user, &kind, Operation::ReadAll)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lovs::new(&mut pool_conn, kind);

    let filter = LovFilter {
        pagination: query.pagination,
        name: query.name,
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(LovResponse::from))
}

#[utoipa::path(
    post,
    path = "/lov/{kind}",
    tag = "lists of values",
    summary = "Create value",
    request_body = LovCreate,
    responses(
        (status = 201, description = "Value created", body = LovResponse),
        (status = 400, description = "Unknown kind or blank name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing the permission for this kind"),
        (status = 409, description = "A value with this name already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(("kind" = LovKind, Path, description = "List of values")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_lov(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(kind): Path<String>,
    Json(create): Json<LovCreate>,
) -> Result<(StatusCode, Json<LovResponse>)> {
    let kind = authorize(&current_user, &kind, Operation::CreateAll)?;
    require_name(&create.name)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lovs::new(&mut pool_conn, kind);

    let value = repo.create(&LovCreateDBRequest::from(create)).await?;
    info!(%kind, value_id = %value.id, "Created list value");

    Ok((StatusCode::CREATED, Json(LovResponse::from(value))))
}

#[utoipa::path(
    get,
    path = "/lov/{kind}/{id}",
    tag = "lists of values",
    summary = "Get value",
    responses(
        (status = 200, description = "Value", body = LovResponse),
        (status = 400, description = "Unknown kind"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing the permission for this kind"),
        (status = 404, description = "Value not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("kind" = LovKind, Path, description = "List of values"),
        ("id" = uuid::Uuid, Path, description = "Value ID")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_lov(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((kind, id)): Path<(String, LovId)>,
) -> Result<Json<LovResponse>> {
    let kind = authorize(&current_user, &kind, Operation::ReadAll)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lovs::new(&mut pool_conn, kind);

    match repo.get_by_id(id).await? {
        Some(value) => Ok(Json(LovResponse::from(value))),
        None => Err(lov_not_found(kind, id)),
    }
}

#[utoipa::path(
    put,
    path = "/lov/{kind}/{id}",
    tag = "lists of values",
    summary = "Update value",
    description = "Only the fields present in the body are changed.",
    request_body = LovUpdate,
    responses(
        (status = 200, description = "Value updated", body = LovResponse),
        (status = 400, description = "Unknown kind, blank name or ID mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing the permission for this kind"),
        (status = 404, description = "Value not found"),
        (status = 409, description = "A value with this name already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("kind" = LovKind, Path, description = "List of values"),
        ("id" = uuid::Uuid, Path, description = "Value ID")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_lov(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((kind, id)): Path<(String, LovId)>,
    Json(update): Json<LovUpdate>,
) -> Result<Json<LovResponse>> {
    let kind = authorize(&current_user, &kind, Operation::UpdateAll)?;
    ensure_matching_id(id, update.id)?;
    if let Some(name) = &update.name {
        require_name(name)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lovs::new(&mut pool_conn, kind);

    let value = repo
        .update(id, &LovUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => lov_not_found(kind, id),
            other => Error::Database(other),
        })?;

    Ok(Json(LovResponse::from(value)))
}

#[utoipa::path(
    delete,
    path = "/lov/{kind}/{id}",
    tag = "lists of values",
    summary = "Delete value",
    description = "Values still referenced by damage reports cannot be deleted. Lectures lose their reference instead.",
    responses(
        (status = 204, description = "Value deleted"),
        (status = 400, description = "Unknown kind, or the value is still referenced"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing the permission for this kind"),
        (status = 404, description = "Value not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("kind" = LovKind, Path, description = "List of values"),
        ("id" = uuid::Uuid, Path, description = "Value ID")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_lov(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((kind, id)): Path<(String, LovId)>,
) -> Result<StatusCode> {
    let kind = authorize(&current_user, &kind, Operation::DeleteAll)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lovs::new(&mut pool_conn, kind);

    if repo.delete(id).await? {
        info!(%kind, value_id = %id, "Deleted list value");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(lov_not_found(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{lov::LovResponse, pagination::PaginationHeader, users::Role},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_lov_crud(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["LOVdp"]).await;
        let token = bearer_token(&user);

        let response = app
            .post("/api/v1/lov/damaged-types")
            .add_header("authorization", &token)
            .json(&json!({"name": "  Torn cover ", "description": "Cover ripped"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: LovResponse = response.json();
        assert_eq!(created.name, "Torn cover");

        let response = app
            .put(&format!("/api/v1/lov/damaged-types/{}", created.id))
            .add_header("authorization", &token)
            .json(&json!({"name": "Torn cover page"}))
            .await;
        response.assert_status_ok();
        let updated: LovResponse = response.json();
        assert_eq!(updated.name, "Torn cover page");
        assert_eq!(updated.description.as_deref(), Some("Cover ripped"));

        let response = app
            .get(&format!("/api/v1/lov/damaged-types/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_ok();

        let response = app
            .delete(&format!("/api/v1/lov/damaged-types/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get(&format!("/api/v1/lov/damaged-types/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_not_found();
        assert!(response.text().starts_with("Damaged Type"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_kind_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::SuperAdmin).await;

        let response = app
            .get("/api/v1/lov/colours")
            .add_header("authorization", bearer_token(&admin))
            .await;
        response.assert_status_bad_request();

        let response = app.get("/api/v1/lov/colours").await;
        response.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_permission_is_per_kind(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["LOVc"]).await;
        let token = bearer_token(&user);

        let response = app.get("/api/v1/lov/companies").add_header("authorization", &token).await;
        response.assert_status_ok();

        let response = app
            .post("/api/v1/lov/device-types")
            .add_header("authorization", &token)
            .json(&json!({"name": "Scanner"}))
            .await;
        response.assert_status_forbidden();

        let admin = create_test_user(&pool, Role::SuperAdmin).await;
        let response = app
            .get("/api/v1/lov/device-types")
            .add_header("authorization", bearer_token(&admin))
            .await;
        let values: Vec<LovResponse> = response.json();
        assert!(values.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_name_and_paginates(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["LOVlt"]).await;
        let token = bearer_token(&user);

        for name in ["Workshop", "Seminar", "Field workshop", "Briefing"] {
            let response = app
                .post("/api/v1/lov/lecture-types")
                .add_header("authorization", &token)
                .json(&json!({"name": name}))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = app
            .get("/api/v1/lov/lecture-types?name=WORKSHOP")
            .add_header("authorization", &token)
            .await;
        response.assert_status_ok();
        let values: Vec<LovResponse> = response.json();
        assert_eq!(values.len(), 2);

        let response = app
            .get("/api/v1/lov/lecture-types?page_number=2&page_size=3")
            .add_header("authorization", &token)
            .await;
        let values: Vec<LovResponse> = response.json();
        assert_eq!(values.len(), 1);
        let header: PaginationHeader = serde_json::from_str(response.header("pagination").to_str().unwrap()).unwrap();
        assert_eq!(header.total_items, 4);
        assert_eq!(header.total_pages, 2);
        assert_eq!(header.current_page, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["LOVc"]).await;
        let token = bearer_token(&user);
        create_test_lov(&pool, crate::api::models::lov::LovKind::Companies, "Acme").await;

        let response = app
            .post("/api/v1/lov/companies")
            .add_header("authorization", &token)
            .json(&json!({"name": "Acme"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_value(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["LOVdt"]).await;

        let response = app
            .put(&format!("/api/v1/lov/device-types/{}", Uuid::new_v4()))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "Laptop"}))
            .await;
        response.assert_status_not_found();
        assert!(response.text().starts_with("Device Type"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_values_are_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["LOVc"]).await;
        let token = bearer_token(&user);

        let response = app
            .post("/api/v1/lov/companies")
            .add_header("authorization", &token)
            .json(&json!({"name": "c".repeat(101)}))
            .await;
        response.assert_status_bad_request();

        let response = app
            .post("/api/v1/lov/companies")
            .add_header("authorization", &token)
            .json(&json!({"name": "Asiacell", "description": "d".repeat(501)}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Value exceeds the maximum length of 500 characters");
    }
}
