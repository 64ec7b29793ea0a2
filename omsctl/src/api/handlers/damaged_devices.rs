use crate::api::handlers::{ensure_matching_id, profiles::ensure_office_in_governorate};
use crate::api::models::damaged_devices::{
    DamagedDeviceCreate, DamagedDeviceResponse, DamagedDeviceSearch, DamagedDeviceUpdate, TypeCount, TypeStatisticsResponse,
};
use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{DamagedDevices, Repository, damaged_devices::DamagedDeviceFilter};
use crate::db::models::damaged_devices::{DamagedDeviceCreateDBRequest, DamagedDeviceUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::DamagedDeviceId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn damaged_device_not_found(id: DamagedDeviceId) -> Error {
    Error::NotFound {
        resource: "Damaged device".to_string(),
        id: id.to_string(),
    }
}

fn require_serial_number(serial_number: &str) -> Result<()> {
    if serial_number.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Serial number is required".to_string(),
        });
    }
    Ok(())
}

impl From<DamagedDeviceSearch> for DamagedDeviceFilter {
    fn from(search: DamagedDeviceSearch) -> Self {
        Self {
            pagination: search.pagination,
            serial_number: search.serial_number,
            start_date: search.start_date,
            end_date: search.end_date,
            damaged_device_type_id: search.damaged_device_type_id,
            device_type_id: search.device_type_id,
            office_id: search.office_id,
            governorate_id: search.governorate_id,
            profile_id: search.profile_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/damaged-devices",
    tag = "damaged devices",
    summary = "List damaged devices",
    responses(
        (status = 200, description = "Page of damaged devices; metadata in the Pagination header", body = Vec<DamagedDeviceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDr"),
        (status = 500, description = "Internal server error")
    ),
    params(PaginationParams),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_damaged_devices(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _: RequiresPermission<resource::DamagedDevices, operation::ReadAll>,
) -> Result<PagedList<DamagedDeviceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedDevices::new(&mut pool_conn);

    let filter = DamagedDeviceFilter {
        pagination,
        ..Default::default()
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(DamagedDeviceResponse::from))
}

#[utoipa::path(
    post,
    path = "/damaged-devices/search",
    tag = "damaged devices",
    summary = "Search damaged devices",
    request_body = DamagedDeviceSearch,
    responses(
        (status = 200, description = "Page of matching devices; metadata in the Pagination header", body = Vec<DamagedDeviceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDr"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_damaged_devices(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DamagedDevices, operation::ReadAll>,
    Json(search): Json<DamagedDeviceSearch>,
) -> Result<PagedList<DamagedDeviceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedDevices::new(&mut pool_conn);

    let page = repo.list(&DamagedDeviceFilter::from(search)).await?;
    Ok(page.map(DamagedDeviceResponse::from))
}

#[utoipa::path(
    post,
    path = "/damaged-devices/search/statistics",
    tag = "damaged devices",
    summary = "Damaged device counts",
    description = "Total and per damaged device type over every device matching the search. Pagination fields are ignored.",
    request_body = DamagedDeviceSearch,
    responses(
        (status = 200, description = "Counts", body = TypeStatisticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sd"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn damaged_device_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DamagedDeviceStatistics, operation::ReadAll>,
    Json(search): Json<DamagedDeviceSearch>,
) -> Result<Json<TypeStatisticsResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedDevices::new(&mut pool_conn);

    let counts = repo.count_by_type(&DamagedDeviceFilter::from(search)).await?;
    Ok(Json(TypeStatisticsResponse::new(counts.into_iter().map(TypeCount::from).collect())))
}

#[utoipa::path(
    get,
    path = "/damaged-devices/serial/{serial_number}",
    tag = "damaged devices",
    summary = "Damaged devices by serial number",
    description = "Every record with exactly this serial number, newest first. A device may be reported more than once.",
    responses(
        (status = 200, description = "Matching devices", body = Vec<DamagedDeviceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDr"),
        (status = 500, description = "Internal server error")
    ),
    params(("serial_number" = String, Path, description = "Device serial number")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_damaged_devices_by_serial(
    State(state): State<AppState>,
    Path(serial_number): Path<String>,
    _: RequiresPermission<resource::DamagedDevices, operation::ReadAll>,
) -> Result<Json<Vec<DamagedDeviceResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedDevices::new(&mut pool_conn);

    let devices = repo.get_by_serial_number(&serial_number).await?;
    Ok(Json(devices.into_iter().map(DamagedDeviceResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/damaged-devices",
    tag = "damaged devices",
    summary = "Report a damaged device",
    request_body = DamagedDeviceCreate,
    responses(
        (status = 201, description = "Damaged device recorded", body = DamagedDeviceResponse),
        (status = 400, description = "Missing serial number, unknown reference, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDc"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_damaged_device(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DamagedDevices, operation::CreateAll>,
    Json(create): Json<DamagedDeviceCreate>,
) -> Result<(StatusCode, Json<DamagedDeviceResponse>)> {
    require_serial_number(&create.serial_number)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_office_in_governorate(&mut tx, create.office_id, create.governorate_id).await?;

    let device = DamagedDevices::new(&mut tx)
        .create(&DamagedDeviceCreateDBRequest::from(create))
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(DamagedDeviceResponse::from(device))))
}

#[utoipa::path(
    get,
    path = "/damaged-devices/{id}",
    tag = "damaged devices",
    summary = "Get damaged device",
    responses(
        (status = 200, description = "Damaged device", body = DamagedDeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDr"),
        (status = 404, description = "Damaged device not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Damaged device ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_damaged_device(
    State(state): State<AppState>,
    Path(id): Path<DamagedDeviceId>,
    _: RequiresPermission<resource::DamagedDevices, operation::ReadAll>,
) -> Result<Json<DamagedDeviceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedDevices::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(device) => Ok(Json(DamagedDeviceResponse::from(device))),
        None => Err(damaged_device_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/damaged-devices/{id}",
    tag = "damaged devices",
    summary = "Update damaged device",
    description = "Only the fields present in the body are changed.",
    request_body = DamagedDeviceUpdate,
    responses(
        (status = 200, description = "Damaged device updated", body = DamagedDeviceResponse),
        (status = 400, description = "ID mismatch, blank serial number, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDu"),
        (status = 404, description = "Damaged device not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Damaged device ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_damaged_device(
    State(state): State<AppState>,
    Path(id): Path<DamagedDeviceId>,
    _: RequiresPermission<resource::DamagedDevices, operation::UpdateAll>,
    Json(update): Json<DamagedDeviceUpdate>,
) -> Result<Json<DamagedDeviceResponse>> {
    ensure_matching_id(id, update.id)?;
    if let Some(serial_number) = &update.serial_number {
        require_serial_number(serial_number)?;
    }
    let request = DamagedDeviceUpdateDBRequest::from(update);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = DamagedDevices::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| damaged_device_not_found(id))?;

    if request.office_id.is_some() || request.governorate_id.is_some() {
        let office_id = request.office_id.unwrap_or(existing.office_id);
        let governorate_id = request.governorate_id.unwrap_or(existing.governorate_id);
        ensure_office_in_governorate(&mut tx, office_id, governorate_id).await?;
    }

    let device = DamagedDevices::new(&mut tx).update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(DamagedDeviceResponse::from(device)))
}

#[utoipa::path(
    delete,
    path = "/damaged-devices/{id}",
    tag = "damaged devices",
    summary = "Delete damaged device",
    responses(
        (status = 204, description = "Damaged device deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DDd"),
        (status = 404, description = "Damaged device not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Damaged device ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_damaged_device(
    State(state): State<AppState>,
    Path(id): Path<DamagedDeviceId>,
    _: RequiresPermission<resource::DamagedDevices, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedDevices::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(damaged_device_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            damaged_devices::{DamagedDeviceResponse, TypeStatisticsResponse},
            lov::LovKind,
            users::Role,
        },
        db::{
            handlers::{DamagedDevices, Repository},
            models::lov::LovDBResponse,
        },
        test_utils::*,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    struct Types {
        screen: LovDBResponse,
        battery: LovDBResponse,
        printer: LovDBResponse,
    }

    async fn create_types(pool: &PgPool) -> Types {
        Types {
            screen: create_test_lov(pool, LovKind::DamagedDeviceTypes, "Broken screen").await,
            battery: create_test_lov(pool, LovKind::DamagedDeviceTypes, "Dead battery").await,
            printer: create_test_lov(pool, LovKind::DeviceTypes, "Printer").await,
        }
    }

    fn device_body(site: &TestSite, serial: &str, date: &str, damage: &LovDBResponse, device: &LovDBResponse) -> Value {
        json!({
            "serial_number": serial,
            "date": date,
            "damaged_device_type_id": damage.id,
            "device_type_id": device.id,
            "office_id": site.office.id,
            "governorate_id": site.governorate.id,
            "profile_id": site.profile.id
        })
    }

    async fn report(app: &TestServer, token: &str, body: Value) -> DamagedDeviceResponse {
        let response = app.post("/api/v1/damaged-devices").add_header("authorization", token).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_damaged_device_crud(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["DDr", "DDc", "DDu", "DDd"]).await;
        let token = bearer_token(&user);
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;

        let created = report(&app, &token, device_body(&site, "SN-001", "2025-02-01", &types.screen, &types.printer)).await;
        assert_eq!(created.damaged_device_type_name, "Broken screen");
        assert_eq!(created.device_type_name, "Printer");
        assert!(created.note.is_none());

        let response = app
            .put(&format!("/api/v1/damaged-devices/{}", created.id))
            .add_header("authorization", &token)
            .json(&json!({"id": created.id, "damaged_device_type_id": types.battery.id, "note": "swapped"}))
            .await;
        response.assert_status_ok();
        let updated: DamagedDeviceResponse = response.json();
        assert_eq!(updated.damaged_device_type_name, "Dead battery");
        assert_eq!(updated.serial_number, "SN-001");
        assert_eq!(updated.note.as_deref(), Some("swapped"));

        let response = app
            .delete(&format!("/api/v1/damaged-devices/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get(&format!("/api/v1/damaged-devices/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_blank_serial_number_rejected(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["DDc"]).await;
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;

        let response = app
            .post("/api/v1/damaged-devices")
            .add_header("authorization", bearer_token(&user))
            .json(&device_body(&site, "  ", "2025-02-01", &types.screen, &types.printer))
            .await;
        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lookup_by_serial_number_returns_every_report(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["DDr", "DDc"]).await;
        let token = bearer_token(&user);
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;

        report(&app, &token, device_body(&site, "SN-REPEAT", "2025-01-10", &types.screen, &types.printer)).await;
        report(&app, &token, device_body(&site, "SN-REPEAT", "2025-03-10", &types.battery, &types.printer)).await;
        report(&app, &token, device_body(&site, "SN-OTHER", "2025-03-11", &types.battery, &types.printer)).await;

        let response = app
            .get("/api/v1/damaged-devices/serial/SN-REPEAT")
            .add_header("authorization", &token)
            .await;
        response.assert_status_ok();
        let devices: Vec<DamagedDeviceResponse> = response.json();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].damaged_device_type_name, "Dead battery");

        let response = app
            .get("/api/v1/damaged-devices/serial/SN-MISSING")
            .add_header("authorization", &token)
            .await;
        response.assert_status_ok();
        let devices: Vec<DamagedDeviceResponse> = response.json();
        assert!(devices.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_and_statistics(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["DDr", "DDc", "Sd"]).await;
        let token = bearer_token(&user);
        let site = create_test_site(&pool).await;
        let other = create_test_site(&pool).await;
        let types = create_types(&pool).await;

        report(&app, &token, device_body(&site, "ab-100", "2025-01-01", &types.screen, &types.printer)).await;
        report(&app, &token, device_body(&site, "AB-200", "2025-01-05", &types.screen, &types.printer)).await;
        report(&app, &token, device_body(&site, "cd-300", "2025-01-09", &types.battery, &types.printer)).await;
        report(&app, &token, device_body(&other, "AB-400", "2025-01-09", &types.battery, &types.printer)).await;

        let response = app
            .post("/api/v1/damaged-devices/search")
            .add_header("authorization", &token)
            .json(&json!({"serial_number": "ab", "office_id": site.office.id}))
            .await;
        response.assert_status_ok();
        let devices: Vec<DamagedDeviceResponse> = response.json();
        assert_eq!(devices.len(), 2);

        let response = app
            .post("/api/v1/damaged-devices/search/statistics")
            .add_header("authorization", &token)
            .json(&json!({"governorate_id": site.governorate.id}))
            .await;
        response.assert_status_ok();
        let stats: TypeStatisticsResponse = response.json();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.by_type.len(), 2);
        let screen = stats.by_type.iter().find(|t| t.type_id == types.screen.id).unwrap();
        assert_eq!(screen.count, 2);

        let response = app
            .post("/api/v1/damaged-devices/search/statistics")
            .add_header("authorization", &token)
            .json(&json!({"start_date": "2025-01-09"}))
            .await;
        let stats: TypeStatisticsResponse = response.json();
        assert_eq!(stats.total_count, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_statistics_require_their_own_permission(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let reader = create_test_user_with_permissions(&pool, Role::Supervisor, &["DDr"]).await;

        let response = app
            .post("/api/v1/damaged-devices/search/statistics")
            .add_header("authorization", bearer_token(&reader))
            .json(&json!({}))
            .await;
        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_denied_delete_keeps_record(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let writer = create_test_user_with_permissions(&pool, Role::Manager, &["DDc", "DDr"]).await;
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;
        let created = report(
            &app,
            &bearer_token(&writer),
            device_body(&site, "SN-KEEP", "2025-02-02", &types.screen, &types.printer),
        )
        .await;

        let response = app
            .delete(&format!("/api/v1/damaged-devices/{}", created.id))
            .add_header("authorization", bearer_token(&writer))
            .await;
        response.assert_status_forbidden();

        let response = app.delete(&format!("/api/v1/damaged-devices/{}", created.id)).await;
        response.assert_status_unauthorized();

        let mut conn = pool.acquire().await.unwrap();
        assert!(DamagedDevices::new(&mut conn).get_by_id(created.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_referenced_lov_cannot_be_deleted(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["DDc", "LOVdd"]).await;
        let token = bearer_token(&user);
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;
        report(&app, &token, device_body(&site, "SN-REF", "2025-02-03", &types.screen, &types.printer)).await;

        let response = app
            .delete(&format!("/api/v1/lov/damaged-device-types/{}", types.screen.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_text_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["DDc", "DDu"]).await;
        let token = bearer_token(&user);
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;

        let serial = "S".repeat(101);
        let response = app
            .post("/api/v1/damaged-devices")
            .add_header("authorization", &token)
            .json(&device_body(&site, &serial, "2025-02-03", &types.screen, &types.printer))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Value exceeds the maximum length of 100 characters");

        let created = report(&app, &token, device_body(&site, "SN-900", "2025-02-03", &types.screen, &types.printer)).await;
        let response = app
            .put(&format!("/api/v1/damaged-devices/{}", created.id))
            .add_header("authorization", &token)
            .json(&json!({"note": "n".repeat(501)}))
            .await;
        response.assert_status_bad_request();

        let mut conn = pool.acquire().await.unwrap();
        let stored = DamagedDevices::new(&mut conn).get_by_id(created.id).await.unwrap().unwrap();
        assert!(stored.note.is_none());
    }
}
