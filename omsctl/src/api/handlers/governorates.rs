use crate::api::handlers::ensure_matching_id;
use crate::api::models::governorates::{GovernorateCreate, GovernorateResponse, GovernorateUpdate, ListGovernoratesQuery};
use crate::api::models::pagination::PagedList;
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{Governorates, Repository, governorates::GovernorateFilter};
use crate::db::models::governorates::{GovernorateCreateDBRequest, GovernorateUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::GovernorateId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/governorates",
    tag = "governorates",
    summary = "List governorates",
    responses(
        (status = 200, description = "Page of governorates; metadata in the Pagination header", body = Vec<GovernorateResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Gr"),
        (status = 500, description = "Internal server error")
    ),
    params(ListGovernoratesQuery),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_governorates(
    State(state): State<AppState>,
    Query(query): Query<ListGovernoratesQuery>,
    _: RequiresPermission<resource::Governorates, operation::ReadAll>,
) -> Result<PagedList<GovernorateResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Governorates::new(&mut pool_conn);

    let filter = GovernorateFilter {
        pagination: query.pagination,
        name: query.name,
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(GovernorateResponse::from))
}

#[utoipa::path(
    post,
    path = "/governorates",
    tag = "governorates",
    summary = "Create governorate",
    request_body = GovernorateCreate,
    responses(
        (status = 201, description = "Governorate created successfully", body = GovernorateResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Gc"),
        (status = 409, description = "A governorate with this name already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_governorate(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Governorates, operation::CreateAll>,
    Json(create): Json<GovernorateCreate>,
) -> Result<(StatusCode, Json<GovernorateResponse>)> {
    if create.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Governorate name is required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Governorates::new(&mut pool_conn);

    let governorate = repo.create(&GovernorateCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(GovernorateResponse::from(governorate))))
}

#[utoipa::path(
    get,
    path = "/governorates/{id}",
    tag = "governorates",
    summary = "Get governorate",
    responses(
        (status = 200, description = "Governorate details", body = GovernorateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Gr"),
        (status = 404, description = "Governorate not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Governorate ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_governorate(
    State(state): State<AppState>,
    Path(id): Path<GovernorateId>,
    _: RequiresPermission<resource::Governorates, operation::ReadAll>,
) -> Result<Json<GovernorateResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Governorates::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(governorate) => Ok(Json(GovernorateResponse::from(governorate))),
        None => Err(Error::NotFound {
            resource: "Governorate".to_string(),
            id: id.to_string(),
        }),
    }
}

#[utoipa::path(
    put,
    path = "/governorates/{id}",
    tag = "governorates",
    summary = "Update governorate",
    description = "Only the fields present in the body are changed.",
    request_body = GovernorateUpdate,
    responses(
        (status = 200, description = "Governorate updated successfully", body = GovernorateResponse),
        (status = 400, description = "ID mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Gu"),
        (status = 404, description = "Governorate not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Governorate ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_governorate(
    State(state): State<AppState>,
    Path(id): Path<GovernorateId>,
    _: RequiresPermission<resource::Governorates, operation::UpdateAll>,
    Json(update): Json<GovernorateUpdate>,
) -> Result<Json<GovernorateResponse>> {
    ensure_matching_id(id, update.id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Governorates::new(&mut pool_conn);

    let governorate = repo.update(id, &GovernorateUpdateDBRequest::from(update)).await?;
    Ok(Json(GovernorateResponse::from(governorate)))
}

#[utoipa::path(
    delete,
    path = "/governorates/{id}",
    tag = "governorates",
    summary = "Delete governorate",
    responses(
        (status = 204, description = "Governorate deleted successfully"),
        (status = 400, description = "Governorate still has offices or profiles"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Gd"),
        (status = 404, description = "Governorate not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Governorate ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_governorate(
    State(state): State<AppState>,
    Path(id): Path<GovernorateId>,
    _: RequiresPermission<resource::Governorates, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Governorates::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Governorate".to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{governorates::GovernorateResponse, pagination::PaginationHeader, users::Role},
        db::handlers::{Governorates, Repository},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn pagination_header(response: &axum_test::TestResponse) -> PaginationHeader {
        let raw = response.header("pagination");
        serde_json::from_str(raw.to_str().unwrap()).unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_governorates_with_pagination(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Supervisor, &["Gr"]).await;
        for name in ["Anbar", "Babil", "Basra", "Dhi Qar", "Diyala"] {
            create_test_governorate(&pool, name).await;
        }

        let response = app
            .get("/api/v1/governorates?page_number=2&page_size=2")
            .add_header("authorization", bearer_token(&user))
            .await;

        response.assert_status_ok();
        let governorates: Vec<GovernorateResponse> = response.json();
        assert_eq!(
            governorates.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
            vec!["Basra", "Dhi Qar"]
        );

        let header = pagination_header(&response);
        assert_eq!(header.current_page, 2);
        assert_eq!(header.items_per_page, 2);
        assert_eq!(header.item_count, 2);
        assert_eq!(header.total_items, 5);
        assert_eq!(header.total_pages, 3);

        // Case-insensitive substring filter on the name
        let response = app
            .get("/api/v1/governorates?name=ba")
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_ok();
        let governorates: Vec<GovernorateResponse> = response.json();
        assert_eq!(
            governorates.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
            vec!["Anbar", "Babil", "Basra"]
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_page_size_is_clamped(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Supervisor, &["Gr"]).await;
        create_test_governorate(&pool, "Kirkuk").await;

        let response = app
            .get("/api/v1/governorates?page_size=100000000")
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_ok();
        assert_eq!(pagination_header(&response).items_per_page, 100_000);

        let response = app
            .get("/api/v1/governorates?page_size=0&page_number=-4")
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_ok();
        let header = pagination_header(&response);
        assert_eq!(header.items_per_page, 1);
        assert_eq!(header.current_page, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_governorate_crud(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Gr", "Gc", "Gu", "Gd"]).await;

        let response = app
            .post("/api/v1/governorates")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "Maysan", "code": "MYS"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: GovernorateResponse = response.json();

        // Only the supplied field changes
        let response = app
            .put(&format!("/api/v1/governorates/{}", created.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"id": created.id, "name": "Misan"}))
            .await;
        response.assert_status_ok();
        let updated: GovernorateResponse = response.json();
        assert_eq!(updated.name, "Misan");
        assert_eq!(updated.code.as_deref(), Some("MYS"));

        let response = app
            .get(&format!("/api/v1/governorates/{}", created.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_ok();

        let response = app
            .delete(&format!("/api/v1/governorates/{}", created.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get(&format!("/api/v1/governorates/{}", created.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_rejects_id_mismatch(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Gu"]).await;
        let governorate = create_test_governorate(&pool, "Wasit").await;

        let response = app
            .put(&format!("/api/v1/governorates/{}", governorate.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"id": Uuid::new_v4(), "name": "Kut"}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "ID mismatch");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Gc"]).await;
        create_test_governorate(&pool, "Nineveh").await;

        let response = app
            .post("/api/v1/governorates")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "Nineveh"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_denied_requests_do_not_mutate(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let reader = create_test_user_with_permissions(&pool, Role::Supervisor, &["Gr"]).await;
        let governorate = create_test_governorate(&pool, "Saladin").await;

        let response = app
            .post("/api/v1/governorates")
            .add_header("authorization", bearer_token(&reader))
            .json(&json!({"name": "Halabja"}))
            .await;
        response.assert_status_forbidden();

        let response = app
            .put(&format!("/api/v1/governorates/{}", governorate.id))
            .add_header("authorization", bearer_token(&reader))
            .json(&json!({"name": "Tikrit"}))
            .await;
        response.assert_status_forbidden();

        let response = app.delete(&format!("/api/v1/governorates/{}", governorate.id)).await;
        response.assert_status_unauthorized();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Governorates::new(&mut conn);
        let stored = repo.get_by_id(governorate.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Saladin");
        assert_eq!(repo.list(&Default::default()).await.unwrap().total_count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_name_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Gc"]).await;

        let response = app
            .post("/api/v1/governorates")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "g".repeat(101)}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Value exceeds the maximum length of 100 characters");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM governorates").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);
    }
}
