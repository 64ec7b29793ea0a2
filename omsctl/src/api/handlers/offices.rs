use crate::api::handlers::ensure_matching_id;
use crate::api::models::offices::{
    ListOfficesQuery, OfficeCreate, OfficeResponse, OfficeStatisticsQuery, OfficeStatisticsResponse, OfficeUpdate,
};
use crate::api::models::pagination::PagedList;
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{Offices, Repository, offices::OfficeFilter};
use crate::db::models::offices::{OfficeCreateDBRequest, OfficeUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::OfficeId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn office_not_found(id: OfficeId) -> Error {
    Error::NotFound {
        resource: "Office".to_string(),
        id: id.to_string(),
    }
}

fn validate_staff_counts(counts: &[Option<i32>]) -> Result<()> {
    if counts.iter().flatten().any(|count| *count < 0) {
        return Err(Error::BadRequest {
            message: "Staff counts cannot be negative".to_string(),
        });
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/offices",
    tag = "offices",
    summary = "List offices",
    responses(
        (status = 200, description = "Page of offices; metadata in the Pagination header", body = Vec<OfficeResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Or"),
        (status = 500, description = "Internal server error")
    ),
    params(ListOfficesQuery),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_offices(
    State(state): State<AppState>,
    Query(query): Query<ListOfficesQuery>,
    _: RequiresPermission<resource::Offices, operation::ReadAll>,
) -> Result<PagedList<OfficeResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut pool_conn);

    let filter = OfficeFilter {
        pagination: query.pagination,
        governorate_id: query.governorate_id,
        name: query.name,
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(OfficeResponse::from))
}

#[utoipa::path(
    post,
    path = "/offices",
    tag = "offices",
    summary = "Create office",
    request_body = OfficeCreate,
    responses(
        (status = 201, description = "Office created successfully", body = OfficeResponse),
        (status = 400, description = "Invalid request or unknown governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Oc"),
        (status = 409, description = "An office with this code already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_office(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Offices, operation::CreateAll>,
    Json(create): Json<OfficeCreate>,
) -> Result<(StatusCode, Json<OfficeResponse>)> {
    if create.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Office name is required".to_string(),
        });
    }
    validate_staff_counts(&[
        Some(create.receiving_staff),
        Some(create.account_staff),
        Some(create.printing_staff),
        Some(create.quality_staff),
        Some(create.delivery_staff),
    ])?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut pool_conn);

    let office = repo.create(&OfficeCreateDBRequest::from(create)).await?;
    Ok((StatusCode::CREATED, Json(OfficeResponse::from(office))))
}

#[utoipa::path(
    get,
    path = "/offices/{id}",
    tag = "offices",
    summary = "Get office",
    responses(
        (status = 200, description = "Office details", body = OfficeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Or"),
        (status = 404, description = "Office not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Office ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_office(
    State(state): State<AppState>,
    Path(id): Path<OfficeId>,
    _: RequiresPermission<resource::Offices, operation::ReadAll>,
) -> Result<Json<OfficeResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(office) => Ok(Json(OfficeResponse::from(office))),
        None => Err(office_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/offices/{id}",
    tag = "offices",
    summary = "Update office",
    description = "Only the fields present in the body are changed.",
    request_body = OfficeUpdate,
    responses(
        (status = 200, description = "Office updated successfully", body = OfficeResponse),
        (status = 400, description = "ID mismatch, invalid staff counts, or a governorate change while records reference the office"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ou"),
        (status = 404, description = "Office not found"),
        (status = 409, description = "An office with this code already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Office ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_office(
    State(state): State<AppState>,
    Path(id): Path<OfficeId>,
    _: RequiresPermission<resource::Offices, operation::UpdateAll>,
    Json(update): Json<OfficeUpdate>,
) -> Result<Json<OfficeResponse>> {
    ensure_matching_id(id, update.id)?;
    validate_staff_counts(&[
        update.receiving_staff,
        update.account_staff,
        update.printing_staff,
        update.quality_staff,
        update.delivery_staff,
    ])?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut tx);

    // Records filed under the office carry its governorate, so it cannot move while they exist
    if let Some(governorate_id) = update.governorate_id {
        let current = repo.get_by_id(id).await?.ok_or_else(|| office_not_found(id))?;
        if current.governorate_id != governorate_id && repo.has_dependents(id).await? {
            return Err(Error::BadRequest {
                message: "Office cannot move to another governorate while records reference it".to_string(),
            });
        }
    }

    let office = repo.update(id, &OfficeUpdateDBRequest::from(update)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(OfficeResponse::from(office)))
}

#[utoipa::path(
    delete,
    path = "/offices/{id}",
    tag = "offices",
    summary = "Delete office",
    responses(
        (status = 204, description = "Office deleted successfully"),
        (status = 400, description = "Office is still referenced by other records"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Od"),
        (status = 404, description = "Office not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Office ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_office(
    State(state): State<AppState>,
    Path(id): Path<OfficeId>,
    _: RequiresPermission<resource::Offices, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(office_not_found(id))
    }
}

#[utoipa::path(
    get,
    path = "/offices/{id}/statistics",
    tag = "offices",
    summary = "Get office staffing",
    description = "The configured staff count of each staff type at one office.",
    responses(
        (status = 200, description = "Office staffing", body = OfficeStatisticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission So"),
        (status = 404, description = "Office not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Office ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_office_statistics(
    State(state): State<AppState>,
    Path(id): Path<OfficeId>,
    _: RequiresPermission<resource::OfficeStatistics, operation::ReadAll>,
) -> Result<Json<OfficeStatisticsResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut pool_conn);

    match repo.statistics(id).await? {
        Some(statistics) => Ok(Json(OfficeStatisticsResponse::from(statistics))),
        None => Err(office_not_found(id)),
    }
}

#[utoipa::path(
    post,
    path = "/offices/statistics",
    tag = "offices",
    summary = "List office staffing",
    description = "Configured staffing of every office, optionally restricted to one governorate.",
    request_body = OfficeStatisticsQuery,
    responses(
        (status = 200, description = "Office staffing", body = Vec<OfficeStatisticsResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission So"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_office_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::OfficeStatistics, operation::ReadAll>,
    Json(query): Json<OfficeStatisticsQuery>,
) -> Result<Json<Vec<OfficeStatisticsResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Offices::new(&mut pool_conn);

    let statistics = repo.statistics_by_governorate(query.governorate_id).await?;
    Ok(Json(statistics.into_iter().map(OfficeStatisticsResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            offices::{OfficeResponse, OfficeStatisticsResponse},
            users::Role,
        },
        db::handlers::{Offices, Repository},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_update_office(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Oc", "Ou", "Or"]).await;
        let governorate = create_test_governorate(&pool, "Baghdad").await;

        let response = app
            .post("/api/v1/offices")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({
                "name": "Karkh",
                "code": 101,
                "governorate_id": governorate.id,
                "receiving_staff": 4,
                "account_staff": 2
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let office: OfficeResponse = response.json();
        assert_eq!(office.governorate_name, "Baghdad");
        assert_eq!(office.receiving_staff, 4);
        // Omitted counts default to zero
        assert_eq!(office.delivery_staff, 0);

        let response = app
            .put(&format!("/api/v1/offices/{}", office.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"delivery_staff": 6}))
            .await;
        response.assert_status_ok();
        let updated: OfficeResponse = response.json();
        assert_eq!(updated.delivery_staff, 6);
        assert_eq!(updated.receiving_staff, 4);
        assert_eq!(updated.name, "Karkh");
        assert_eq!(updated.code, 101);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_staff_count_is_rejected(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Oc", "Ou"]).await;
        let governorate = create_test_governorate(&pool, "Babil").await;
        let office = create_test_office(&pool, governorate.id, 7).await;

        let response = app
            .post("/api/v1/offices")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "Hilla", "code": 8, "governorate_id": governorate.id, "quality_staff": -1}))
            .await;
        response.assert_status_bad_request();

        let response = app
            .put(&format!("/api/v1/offices/{}", office.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"account_staff": -3}))
            .await;
        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_code_conflicts(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Oc"]).await;
        let governorate = create_test_governorate(&pool, "Basra").await;
        create_test_office(&pool, governorate.id, 55).await;

        let response = app
            .post("/api/v1/offices")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "Zubair", "code": 55, "governorate_id": governorate.id}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_offices_by_governorate(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Supervisor, &["Or"]).await;
        let north = create_test_governorate(&pool, "Duhok").await;
        let south = create_test_governorate(&pool, "Muthanna").await;
        create_test_office(&pool, north.id, 1).await;
        create_test_office(&pool, north.id, 2).await;
        create_test_office(&pool, south.id, 3).await;

        let response = app
            .get(&format!("/api/v1/offices?governorate_id={}", north.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_ok();
        let offices: Vec<OfficeResponse> = response.json();
        assert_eq!(offices.len(), 2);
        assert!(offices.iter().all(|o| o.governorate_id == north.id));

        let response = app.get("/api/v1/offices").add_header("authorization", bearer_token(&user)).await;
        let offices: Vec<OfficeResponse> = response.json();
        assert_eq!(offices.len(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_office_statistics(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["So"]).await;
        let governorate = create_test_governorate(&pool, "Kirkuk").await;
        let other = create_test_governorate(&pool, "Anbar").await;
        let office = create_test_office(&pool, governorate.id, 21).await;
        create_test_office(&pool, other.id, 22).await;

        let response = app
            .get(&format!("/api/v1/offices/{}/statistics", office.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_ok();
        let statistics: OfficeStatisticsResponse = response.json();
        assert_eq!(statistics.name, "Office 21");
        assert_eq!(statistics.receiving_staff, 3);
        assert_eq!(statistics.delivery_staff, 4);

        let response = app
            .post("/api/v1/offices/statistics")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"governorate_id": governorate.id}))
            .await;
        response.assert_status_ok();
        let statistics: Vec<OfficeStatisticsResponse> = response.json();
        assert_eq!(statistics.len(), 1);

        let response = app
            .post("/api/v1/offices/statistics")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({}))
            .await;
        let statistics: Vec<OfficeStatisticsResponse> = response.json();
        assert_eq!(statistics.len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_statistics_need_their_own_permission(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Or", "Oc", "Ou", "Od"]).await;
        let governorate = create_test_governorate(&pool, "Najaf").await;
        let office = create_test_office(&pool, governorate.id, 31).await;

        let response = app
            .get(&format!("/api/v1/offices/{}/statistics", office.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_forbidden_delete_keeps_office(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let reader = create_test_user_with_permissions(&pool, Role::Supervisor, &["Or"]).await;
        let governorate = create_test_governorate(&pool, "Karbala").await;
        let office = create_test_office(&pool, governorate.id, 41).await;

        let response = app
            .delete(&format!("/api/v1/offices/{}", office.id))
            .add_header("authorization", bearer_token(&reader))
            .await;
        response.assert_status_forbidden();

        let mut conn = pool.acquire().await.unwrap();
        assert!(Offices::new(&mut conn).get_by_id(office.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_governorate_with_offices_cannot_be_deleted(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Gd"]).await;
        let governorate = create_test_governorate(&pool, "Diyala").await;
        create_test_office(&pool, governorate.id, 51).await;

        let response = app
            .delete(&format!("/api/v1/governorates/{}", governorate.id))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Resource is still referenced by other records");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_name_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Oc", "Ou"]).await;
        let governorate = create_test_governorate(&pool, "Najaf").await;
        let office = create_test_office(&pool, governorate.id, 31).await;

        let response = app
            .post("/api/v1/offices")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "o".repeat(101), "code": 32, "governorate_id": governorate.id}))
            .await;
        response.assert_status_bad_request();

        let response = app
            .put(&format!("/api/v1/offices/{}", office.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"name": "o".repeat(101)}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Value exceeds the maximum length of 100 characters");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_office_with_records_keeps_its_governorate(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["Ou"]).await;
        let site = create_test_site(&pool).await;
        let elsewhere = create_test_governorate(&pool, "Karbala").await;

        // The site's profile is filed under the office
        let response = app
            .put(&format!("/api/v1/offices/{}", site.office.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"governorate_id": elsewhere.id}))
            .await;
        response.assert_status_bad_request();

        let mut conn = pool.acquire().await.unwrap();
        let office = Offices::new(&mut conn).get_by_id(site.office.id).await.unwrap().unwrap();
        assert_eq!(office.governorate_id, site.governorate.id);

        // Restating the current governorate is fine, and an empty office may move
        let response = app
            .put(&format!("/api/v1/offices/{}", site.office.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"governorate_id": site.governorate.id, "printing_staff": 5}))
            .await;
        response.assert_status_ok();

        let empty = create_test_office(&pool, site.governorate.id, 77).await;
        let response = app
            .put(&format!("/api/v1/offices/{}", empty.id))
            .add_header("authorization", bearer_token(&user))
            .json(&json!({"governorate_id": elsewhere.id}))
            .await;
        response.assert_status_ok();
        let moved: OfficeResponse = response.json();
        assert_eq!(moved.governorate_name, "Karbala");
    }
}
