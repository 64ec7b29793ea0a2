use crate::api::handlers::{ensure_matching_id, profiles::ensure_office_in_governorate};
use crate::api::models::attendances::{
    AttendanceCreate, AttendanceResponse, AttendanceSearch, AttendanceStatisticsResponse, AttendanceUpdate,
    GovernorateAttendanceStatisticsQuery, GovernorateAttendanceStatisticsResponse, OfficeAttendanceStatisticsQuery,
    OfficeAttendanceStatisticsResponse, StaffCounts, StaffType, StaffTypeStatisticsQuery, StaffTypeStatisticsResponse,
    UnavailableOffice, UnavailableOfficesQuery, UnavailableOfficesResponse,
};
use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{Attendances, Offices, Repository, attendances::AttendanceFilter};
use crate::db::models::attendances::{AttendanceCreateDBRequest, AttendanceUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::AttendanceId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn attendance_not_found(id: AttendanceId) -> Error {
    Error::NotFound {
        resource: "Attendance".to_string(),
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

impl From<AttendanceSearch> for AttendanceFilter {
    fn from(search: AttendanceSearch) -> Self {
        Self {
            pagination: search.pagination,
            working_hours: search.working_hours,
            start_date: search.start_date,
            end_date: search.end_date,
            office_id: search.office_id,
            governorate_id: search.governorate_id,
            profile_id: search.profile_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/attendances",
    tag = "attendances",
    summary = "List attendance records",
    description = "Newest first.",
    responses(
        (status = 200, description = "Page of attendance records; metadata in the Pagination header", body = Vec<AttendanceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ar"),
        (status = 500, description = "Internal server error")
    ),
    params(PaginationParams),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_attendances(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _: RequiresPermission<resource::Attendances, operation::ReadAll>,
) -> Result<PagedList<AttendanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    let filter = AttendanceFilter {
        pagination,
        ..Default::default()
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(AttendanceResponse::from))
}

#[utoipa::path(
    post,
    path = "/attendances/search",
    tag = "attendances",
    summary = "Search attendance records",
    description = "Every field of the body is optional; absent fields do not narrow the result.",
    request_body = AttendanceSearch,
    responses(
        (status = 200, description = "Page of matching records; metadata in the Pagination header", body = Vec<AttendanceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ar"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_attendances(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Attendances, operation::ReadAll>,
    Json(search): Json<AttendanceSearch>,
) -> Result<PagedList<AttendanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    let page = repo.list(&AttendanceFilter::from(search)).await?;
    Ok(page.map(AttendanceResponse::from))
}

#[utoipa::path(
    post,
    path = "/attendances",
    tag = "attendances",
    summary = "Record attendance",
    request_body = AttendanceCreate,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceResponse),
        (status = 400, description = "Invalid counts, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ac"),
        (status = 409, description = "Attendance for this office, date and working hours already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_attendance(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Attendances, operation::CreateAll>,
    Json(create): Json<AttendanceCreate>,
) -> Result<(StatusCode, Json<AttendanceResponse>)> {
    validate_staff_counts(&[
        Some(create.receiving_staff),
        Some(create.account_staff),
        Some(create.printing_staff),
        Some(create.quality_staff),
        Some(create.delivery_staff),
    ])?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_office_in_governorate(&mut tx, create.office_id, create.governorate_id).await?;

    let attendance = Attendances::new(&mut tx)
        .create(&AttendanceCreateDBRequest::from(create))
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(AttendanceResponse::from(attendance))))
}

#[utoipa::path(
    get,
    path = "/attendances/{id}",
    tag = "attendances",
    summary = "Get attendance record",
    responses(
        (status = 200, description = "Attendance record", body = AttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ar"),
        (status = 404, description = "Attendance not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Attendance ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_attendance(
    State(state): State<AppState>,
    Path(id): Path<AttendanceId>,
    _: RequiresPermission<resource::Attendances, operation::ReadAll>,
) -> Result<Json<AttendanceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(attendance) => Ok(Json(AttendanceResponse::from(attendance))),
        None => Err(attendance_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/attendances/{id}",
    tag = "attendances",
    summary = "Update attendance record",
    description = "Only the fields present in the body are changed.",
    request_body = AttendanceUpdate,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceResponse),
        (status = 400, description = "ID mismatch or invalid counts"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Au"),
        (status = 404, description = "Attendance not found"),
        (status = 409, description = "Another record exists for this office, date and working hours"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Attendance ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_attendance(
    State(state): State<AppState>,
    Path(id): Path<AttendanceId>,
    _: RequiresPermission<resource::Attendances, operation::UpdateAll>,
    Json(update): Json<AttendanceUpdate>,
) -> Result<Json<AttendanceResponse>> {
    ensure_matching_id(id, update.id)?;
    validate_staff_counts(&[
        update.receiving_staff,
        update.account_staff,
        update.printing_staff,
        update.quality_staff,
        update.delivery_staff,
    ])?;
    let request = AttendanceUpdateDBRequest::from(update);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = Attendances::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| attendance_not_found(id))?;

    if request.office_id.is_some() || request.governorate_id.is_some() {
        let office_id = request.office_id.unwrap_or(existing.office_id);
        let governorate_id = request.governorate_id.unwrap_or(existing.governorate_id);
        ensure_office_in_governorate(&mut tx, office_id, governorate_id).await?;
    }

    let attendance = Attendances::new(&mut tx).update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(AttendanceResponse::from(attendance)))
}

#[utoipa::path(
    delete,
    path = "/attendances/{id}",
    tag = "attendances",
    summary = "Delete attendance record",
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ad"),
        (status = 404, description = "Attendance not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Attendance ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_attendance(
    State(state): State<AppState>,
    Path(id): Path<AttendanceId>,
    _: RequiresPermission<resource::Attendances, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(attendance_not_found(id))
    }
}

#[utoipa::path(
    post,
    path = "/attendances/search/statistics",
    tag = "attendance statistics",
    summary = "Attendance totals",
    description = "Record count and summed staff over every record matching the search. Pagination fields are ignored.",
    request_body = AttendanceSearch,
    responses(
        (status = 200, description = "Totals", body = AttendanceStatisticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sa"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::AttendanceStatistics, operation::ReadAll>,
    Json(search): Json<AttendanceSearch>,
) -> Result<Json<AttendanceStatisticsResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    let totals = repo.totals(&AttendanceFilter::from(search)).await?;
    Ok(Json(AttendanceStatisticsResponse::from(totals)))
}

#[utoipa::path(
    post,
    path = "/attendances/statistics/office",
    tag = "attendance statistics",
    summary = "Office attendance",
    description = "An office's configured staffing next to the staff its matching records report.",
    request_body = OfficeAttendanceStatisticsQuery,
    responses(
        (status = 200, description = "Office attendance", body = OfficeAttendanceStatisticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sa"),
        (status = 404, description = "Office not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn office_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::AttendanceStatistics, operation::ReadAll>,
    Json(query): Json<OfficeAttendanceStatisticsQuery>,
) -> Result<Json<OfficeAttendanceStatisticsResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let office = Offices::new(&mut tx)
        .get_by_id(query.office_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Office".to_string(),
            id: query.office_id.to_string(),
        })?;

    let filter = AttendanceFilter {
        office_id: Some(query.office_id),
        start_date: query.start_date,
        end_date: query.end_date,
        working_hours: query.working_hours,
        ..Default::default()
    };
    let totals = Attendances::new(&mut tx).totals(&filter).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let attended = AttendanceStatisticsResponse::from(totals);
    Ok(Json(OfficeAttendanceStatisticsResponse {
        office_id: office.id,
        office_name: office.name,
        record_count: attended.record_count,
        expected_staff: StaffCounts::new(
            office.receiving_staff.into(),
            office.account_staff.into(),
            office.printing_staff.into(),
            office.quality_staff.into(),
            office.delivery_staff.into(),
        ),
        attended_staff: attended.staff,
    }))
}

#[utoipa::path(
    post,
    path = "/attendances/governorate-statistics",
    tag = "attendance statistics",
    summary = "Attendance per governorate",
    description = "Per governorate: number of offices, offices with a matching record and summed staff.",
    request_body = GovernorateAttendanceStatisticsQuery,
    responses(
        (status = 200, description = "Governorate attendance", body = Vec<GovernorateAttendanceStatisticsResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sa"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn governorate_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::AttendanceStatistics, operation::ReadAll>,
    Json(query): Json<GovernorateAttendanceStatisticsQuery>,
) -> Result<Json<Vec<GovernorateAttendanceStatisticsResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    let stats = repo
        .governorate_statistics(query.governorate_id, query.date, query.working_hours)
        .await?;
    Ok(Json(stats.into_iter().map(GovernorateAttendanceStatisticsResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/attendances/statistics/unavailable",
    tag = "attendance statistics",
    summary = "Offices without attendance",
    description = "Offices with no attendance record for the date (and working hours, when given).",
    request_body = UnavailableOfficesQuery,
    responses(
        (status = 200, description = "Offices without attendance", body = UnavailableOfficesResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sa"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn unavailable_offices(
    State(state): State<AppState>,
    _: RequiresPermission<resource::AttendanceStatistics, operation::ReadAll>,
    Json(query): Json<UnavailableOfficesQuery>,
) -> Result<Json<UnavailableOfficesResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    let offices = repo
        .unavailable_offices(query.date, query.working_hours, query.governorate_id)
        .await?;
    Ok(Json(UnavailableOfficesResponse::new(
        offices.into_iter().map(UnavailableOffice::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/attendances/search/type-statistics",
    tag = "attendance statistics",
    summary = "Availability of one staff type",
    description = "Per office: configured staff of the type against the staff of the type reported on the date.",
    request_body = StaffTypeStatisticsQuery,
    responses(
        (status = 200, description = "Availability per office", body = Vec<StaffTypeStatisticsResponse>),
        (status = 400, description = "StaffType and Date are required, or the staff type is unknown"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Sa"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn staff_type_statistics(
    State(state): State<AppState>,
    _: RequiresPermission<resource::AttendanceStatistics, operation::ReadAll>,
    Json(query): Json<StaffTypeStatisticsQuery>,
) -> Result<Json<Vec<StaffTypeStatisticsResponse>>> {
    let (Some(staff_type), Some(date)) = (query.staff_type.as_deref().filter(|s| !s.trim().is_empty()), query.date) else {
        return Err(Error::BadRequest {
            message: "StaffType and Date are required.".to_string(),
        });
    };
    let staff_type: StaffType = staff_type.parse()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attendances::new(&mut pool_conn);

    let availability = repo
        .staff_type_availability(staff_type, date, query.working_hours, query.governorate_id, query.office_id)
        .await?;
    Ok(Json(availability.into_iter().map(StaffTypeStatisticsResponse::from).collect()))
}
