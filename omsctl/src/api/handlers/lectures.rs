use crate::api::handlers::{ensure_matching_id, profiles::ensure_office_in_governorate};
use crate::api::models::lectures::{LectureCreate, LectureResponse, LectureSearch, LectureUpdate};
use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{Lectures, Repository, lectures::LectureFilter};
use crate::db::models::lectures::{LectureCreateDBRequest, LectureUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::LectureId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn lecture_not_found(id: LectureId) -> Error {
    Error::NotFound {
        resource: "Lecture".to_string(),
        id: id.to_string(),
    }
}

impl From<LectureSearch> for LectureFilter {
    fn from(search: LectureSearch) -> Self {
        Self {
            pagination: search.pagination,
            title: search.title,
            start_date: search.start_date,
            end_date: search.end_date,
            office_id: search.office_id,
            governorate_id: search.governorate_id,
            profile_id: search.profile_id,
            company_id: search.company_id,
            lecture_type_id: search.lecture_type_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/lectures",
    tag = "lectures",
    summary = "List lectures",
    responses(
        (status = 200, description = "Page of lectures; metadata in the Pagination header", body = Vec<LectureResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Lr"),
        (status = 500, description = "Internal server error")
    ),
    params(PaginationParams),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_lectures(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _: RequiresPermission<resource::Lectures, operation::ReadAll>,
) -> Result<PagedList<LectureResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lectures::new(&mut pool_conn);

    let filter = LectureFilter {
        pagination,
        ..Default::default()
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(LectureResponse::from))
}

#[utoipa::path(
    post,
    path = "/lectures/search",
    tag = "lectures",
    summary = "Search lectures",
    request_body = LectureSearch,
    responses(
        (status = 200, description = "Page of matching lectures; metadata in the Pagination header", body = Vec<LectureResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Lr"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_lectures(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Lectures, operation::ReadAll>,
    Json(search): Json<LectureSearch>,
) -> Result<PagedList<LectureResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lectures::new(&mut pool_conn);

    let page = repo.list(&LectureFilter::from(search)).await?;
    Ok(page.map(LectureResponse::from))
}

#[utoipa::path(
    post,
    path = "/lectures",
    tag = "lectures",
    summary = "Record a lecture",
    request_body = LectureCreate,
    responses(
        (status = 201, description = "Lecture recorded", body = LectureResponse),
        (status = 400, description = "Title missing or too long, note too long, unknown reference, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Lc"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_lecture(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Lectures, operation::CreateAll>,
    Json(create): Json<LectureCreate>,
) -> Result<(StatusCode, Json<LectureResponse>)> {
    create.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_office_in_governorate(&mut tx, create.office_id, create.governorate_id).await?;

    let lecture = Lectures::new(&mut tx).create(&LectureCreateDBRequest::from(create)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(LectureResponse::from(lecture))))
}

#[utoipa::path(
    get,
    path = "/lectures/{id}",
    tag = "lectures",
    summary = "Get lecture",
    responses(
        (status = 200, description = "Lecture", body = LectureResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Lr"),
        (status = 404, description = "Lecture not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Lecture ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_lecture(
    State(state): State<AppState>,
    Path(id): Path<LectureId>,
    _: RequiresPermission<resource::Lectures, operation::ReadAll>,
) -> Result<Json<LectureResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lectures::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(lecture) => Ok(Json(LectureResponse::from(lecture))),
        None => Err(lecture_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/lectures/{id}",
    tag = "lectures",
    summary = "Update lecture",
    description = "Only the fields present in the body are changed.",
    request_body = LectureUpdate,
    responses(
        (status = 200, description = "Lecture updated", body = LectureResponse),
        (status = 400, description = "ID mismatch, invalid text, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Lu"),
        (status = 404, description = "Lecture not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Lecture ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_lecture(
    State(state): State<AppState>,
    Path(id): Path<LectureId>,
    _: RequiresPermission<resource::Lectures, operation::UpdateAll>,
    Json(update): Json<LectureUpdate>,
) -> Result<Json<LectureResponse>> {
    ensure_matching_id(id, update.id)?;
    update.validate()?;
    let request = LectureUpdateDBRequest::from(update);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = Lectures::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| lecture_not_found(id))?;

    if request.office_id.is_some() || request.governorate_id.is_some() {
        let office_id = request.office_id.unwrap_or(existing.office_id);
        let governorate_id = request.governorate_id.unwrap_or(existing.governorate_id);
        ensure_office_in_governorate(&mut tx, office_id, governorate_id).await?;
    }

    let lecture = Lectures::new(&mut tx).update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(LectureResponse::from(lecture)))
}

#[utoipa::path(
    delete,
    path = "/lectures/{id}",
    tag = "lectures",
    summary = "Delete lecture",
    responses(
        (status = 204, description = "Lecture deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ld"),
        (status = 404, description = "Lecture not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Lecture ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_lecture(
    State(state): State<AppState>,
    Path(id): Path<LectureId>,
    _: RequiresPermission<resource::Lectures, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Lectures::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(lecture_not_found(id))
    }
}
