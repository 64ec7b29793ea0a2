use crate::api::handlers::{ensure_matching_id, profiles::ensure_office_in_governorate};
use crate::api::models::damaged_devices::{TypeCount, TypeStatisticsResponse};
use crate::api::models::damaged_passports::{
    DamagedPassportCreate, DamagedPassportResponse, DamagedPassportSearch, DamagedPassportUpdate,
};
use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{DamagedPassports, Repository, damaged_passports::DamagedPassportFilter};
use crate::db::models::damaged_passports::{DamagedPassportCreateDBRequest, DamagedPassportUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::DamagedPassportId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgConnection;

fn damaged_passport_not_found(id: DamagedPassportId) -> Error {
    Error::NotFound {
        resource: "Damaged passport".to_string(),
        id: id.to_string(),
    }
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    Ok(())
}

/// Passport numbers are not unique in storage; a second report of the same number is refused here.
///
/// Runs inside the caller's transaction. The number stays locked until it commits, so concurrent
/// reports of one number are checked one after the other.
async fn ensure_passport_not_recorded(conn: &mut PgConnection, passport_number: &str) -> Result<()> {
    let mut repo = DamagedPassports::new(conn);
    repo.lock_passport_number(passport_number).await?;
    if repo.passport_number_exists(passport_number).await? {
        return Err(Error::Conflict {
            message: format!("Passport number '{passport_number}' is already recorded"),
        });
    }
    Ok(())
}

impl From<DamagedPassportSearch> for DamagedPassportFilter {
    fn from(search: DamagedPassportSearch) -> Self {
        Self {
            pagination: search.pagination,
            passport_number: search.passport_number,
            start_date: search.start_date,
            end_date: search.end_date,
            damaged_type_id: search.damaged_type_id,
            office_id: search.office_id,
            governorate_id: search.governorate_id,
            profile_id: search.profile_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/damaged-passports",
    tag = "damaged passports",
    summary = "List damaged passports",
    responses(
        (status = 200, description = "Page of damaged passports; metadata in the Pagination header", body = Vec<DamagedPassportResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DPr"),
        (status = 500, description = "Internal server error")
    ),
    params(PaginationParams),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_damaged_passports(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _: RequiresPermission<resource::DamagedPassports, operation::ReadAll>,
) -> Result<PagedList<DamagedPassportResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedPassports::new(&mut pool_conn);

    let filter = DamagedPassportFilter {
        pagination,
        ..Default::default()
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(DamagedPassportResponse::from))
}

#[utoipa::path(
    post,
    path = "/damaged-passports/search",
    tag = "damaged passports",
    summary = "Search damaged passports",
    request_body = DamagedPassportSearch,
    responses(
        (status = 200, description = "Page of matching passports; metadata in the Pagination header", body = Vec<DamagedPassportResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DPr"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_damaged_passports(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DamagedPassports, operation::ReadAll>,
    Json(search): Json<DamagedPassportSearch>,
) -> Result<PagedList<DamagedPassportResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedPassports::new(&mut pool_conn);

    let page = repo.list(&DamagedPassportFilter::from(search)).await?;
    Ok(page.map(DamagedPassportResponse::from))
}

#[utoipa::path(
    post,
    path = "/damaged-passports/search/statistics",
    tag = "damaged passports",
    summary = "Damaged passport counts",
    description = "Total and per damaged type over every passport matching the search. Pagination fields are ignored.",
    request_body = DamagedPassportSearch,
    responses(
        (status = 200, description = "Counts", body = TypeStatisticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sp"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn damaged_passport_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DamagedPassportStatistics, operation::ReadAll>,
    Json(search): Json<DamagedPassportSearch>,
) -> Result<Json<TypeStatisticsResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedPassports::new(&mut pool_conn);

    let counts = repo.count_by_type(&DamagedPassportFilter::from(search)).await?;
    Ok(Json(TypeStatisticsResponse::new(counts.into_iter().map(TypeCount::from).collect())))
}

#[utoipa::path(
    post,
    path = "/damaged-passports",
    tag = "damaged passports",
    summary = "Report a damaged passport",
    request_body = DamagedPassportCreate,
    responses(
        (status = 201, description = "Damaged passport recorded", body = DamagedPassportResponse),
        (status = 400, description = "Missing field, unknown reference, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DPc"),
        (status = 409, description = "Passport number already recorded"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_damaged_passport(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DamagedPassports, operation::CreateAll>,
    Json(create): Json<DamagedPassportCreate>,
) -> Result<(StatusCode, Json<DamagedPassportResponse>)> {
    require_text(&create.passport_number, "Passport number")?;
    require_text(&create.full_name, "Full name")?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_passport_not_recorded(&mut tx, &create.passport_number).await?;
    ensure_office_in_governorate(&mut tx, create.office_id, create.governorate_id).await?;

    let passport = DamagedPassports::new(&mut tx)
        .create(&DamagedPassportCreateDBRequest::from(create))
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(DamagedPassportResponse::from(passport))))
}

#[utoipa::path(
    get,
    path = "/damaged-passports/{id}",
    tag = "damaged passports",
    summary = "Get damaged passport",
    responses(
        (status = 200, description = "Damaged passport", body = DamagedPassportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DPr"),
        (status = 404, description = "Damaged passport not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Damaged passport ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_damaged_passport(
    State(state): State<AppState>,
    Path(id): Path<DamagedPassportId>,
    _: RequiresPermission<resource::DamagedPassports, operation::ReadAll>,
) -> Result<Json<DamagedPassportResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedPassports::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(passport) => Ok(Json(DamagedPassportResponse::from(passport))),
        None => Err(damaged_passport_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/damaged-passports/{id}",
    tag = "damaged passports",
    summary = "Update damaged passport",
    description = "Only the fields present in the body are changed.",
    request_body = DamagedPassportUpdate,
    responses(
        (status = 200, description = "Damaged passport updated", body = DamagedPassportResponse),
        (status = 400, description = "ID mismatch, blank field, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DPu"),
        (status = 404, description = "Damaged passport not found"),
        (status = 409, description = "Passport number already recorded on another report"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Damaged passport ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_damaged_passport(
    State(state): State<AppState>,
    Path(id): Path<DamagedPassportId>,
    _: RequiresPermission<resource::DamagedPassports, operation::UpdateAll>,
    Json(update): Json<DamagedPassportUpdate>,
) -> Result<Json<DamagedPassportResponse>> {
    ensure_matching_id(id, update.id)?;
    if let Some(passport_number) = &update.passport_number {
        require_text(passport_number, "Passport number")?;
    }
    if let Some(full_name) = &update.full_name {
        require_text(full_name, "Full name")?;
    }
    let request = DamagedPassportUpdateDBRequest::from(update);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = DamagedPassports::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| damaged_passport_not_found(id))?;

    if let Some(passport_number) = &request.passport_number
        && *passport_number != existing.passport_number
    {
        ensure_passport_not_recorded(&mut tx, passport_number).await?;
    }
    if request.office_id.is_some() || request.governorate_id.is_some() {
        let office_id = request.office_id.unwrap_or(existing.office_id);
        let governorate_id = request.governorate_id.unwrap_or(existing.governorate_id);
        ensure_office_in_governorate(&mut tx, office_id, governorate_id).await?;
    }

    let passport = DamagedPassports::new(&mut tx).update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(DamagedPassportResponse::from(passport)))
}

#[utoipa::path(
    delete,
    path = "/damaged-passports/{id}",
    tag = "damaged passports",
    summary = "Delete damaged passport",
    responses(
        (status = 204, description = "Damaged passport deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission DPd"),
        (status = 404, description = "Damaged passport not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Damaged passport ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_damaged_passport(
    State(state): State<AppState>,
    Path(id): Path<DamagedPassportId>,
    _: RequiresPermission<resource::DamagedPassports, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DamagedPassports::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(damaged_passport_not_found(id))
    }
}
