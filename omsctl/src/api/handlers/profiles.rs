use crate::api::handlers::ensure_matching_id;
use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::api::models::profiles::{ProfileCreate, ProfileResponse, ProfileSearch, ProfileUpdate, UserProfileResponse};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{RequiresPermission, operation, require_permission, resource};
use crate::db::handlers::{Offices, Profiles, Repository, profiles::ProfileFilter};
use crate::db::models::profiles::{ProfileCreateDBRequest, ProfileUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{GovernorateId, OfficeId, Operation, Resource};
use crate::{
    AppState,
    types::{ProfileId, UserId},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgConnection;

fn profile_not_found(id: impl ToString) -> Error {
    Error::NotFound {
        resource: "Profile".to_string(),
        id: id.to_string(),
    }
}

/// A profile's office must sit in the profile's governorate
pub(crate) async fn ensure_office_in_governorate(
    conn: &mut PgConnection,
    office_id: OfficeId,
    governorate_id: GovernorateId,
) -> Result<()> {
    if Offices::new(conn).belongs_to(office_id, governorate_id).await? {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: "The office does not belong to the selected governorate".to_string(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/profiles",
    tag = "profiles",
    summary = "List profiles",
    responses(
        (status = 200, description = "Page of profiles; metadata in the Pagination header", body = Vec<ProfileResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pr"),
        (status = 500, description = "Internal server error")
    ),
    params(PaginationParams),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _: RequiresPermission<resource::Profiles, operation::ReadAll>,
) -> Result<PagedList<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let filter = ProfileFilter {
        pagination,
        ..Default::default()
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(ProfileResponse::from))
}

#[utoipa::path(
    post,
    path = "/profiles/search",
    tag = "profiles",
    summary = "Search profiles",
    description = "Every field of the body is optional; absent fields do not narrow the result.",
    request_body = ProfileSearch,
    responses(
        (status = 200, description = "Page of matching profiles; metadata in the Pagination header", body = Vec<ProfileResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pr"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_profiles(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Profiles, operation::ReadAll>,
    Json(search): Json<ProfileSearch>,
) -> Result<PagedList<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let filter = ProfileFilter {
        pagination: search.pagination,
        office_id: search.office_id,
        governorate_id: search.governorate_id,
        full_name: search.full_name,
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(ProfileResponse::from))
}

#[utoipa::path(
    post,
    path = "/profiles",
    tag = "profiles",
    summary = "Create profile",
    request_body = ProfileCreate,
    responses(
        (status = 201, description = "Profile created successfully", body = ProfileResponse),
        (status = 400, description = "Invalid request, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pc"),
        (status = 409, description = "This user already has a profile"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_profile(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Profiles, operation::CreateAll>,
    Json(create): Json<ProfileCreate>,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    if create.full_name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Full name is required".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_office_in_governorate(&mut tx, create.office_id, create.governorate_id).await?;

    let profile = Profiles::new(&mut tx).create(&ProfileCreateDBRequest::from(create)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "profiles",
    summary = "Get profile",
    responses(
        (status = 200, description = "Profile details", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pr"),
        (status = 404, description = "Profile not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Profile ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<ProfileId>,
    _: RequiresPermission<resource::Profiles, operation::ReadAll>,
) -> Result<Json<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(profile) => Ok(Json(ProfileResponse::from(profile))),
        None => Err(profile_not_found(id)),
    }
}

#[utoipa::path(
    get,
    path = "/profiles/user/{user_id}",
    tag = "profiles",
    summary = "Get a user's profile",
    description = "Allowed with permission Pr, or for the caller's own user ID.",
    responses(
        (status = 200, description = "Profile of the user", body = UserProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pr"),
        (status = 404, description = "The user has no profile"),
        (status = 500, description = "Internal server error")
    ),
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    current_user: CurrentUser,
) -> Result<Json<UserProfileResponse>> {
    if current_user.id != user_id {
        require_permission(&current_user, Resource::Profiles, Operation::ReadAll)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    match repo.get_by_user_id(user_id).await? {
        Some(profile) => Ok(Json(UserProfileResponse::from(profile))),
        None => Err(Error::NotFound {
            resource: "Profile for user".to_string(),
            id: user_id.to_string(),
        }),
    }
}

#[utoipa::path(
    put,
    path = "/profiles/{id}",
    tag = "profiles",
    summary = "Update profile",
    description = "Only the fields present in the body are changed.",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated successfully", body = ProfileResponse),
        (status = 400, description = "ID mismatch, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pu"),
        (status = 404, description = "Profile not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Profile ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<ProfileId>,
    _: RequiresPermission<resource::Profiles, operation::UpdateAll>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>> {
    ensure_matching_id(id, update.id)?;
    let request = ProfileUpdateDBRequest::from(update);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let existing = Profiles::new(&mut tx).get_by_id(id).await?.ok_or_else(|| profile_not_found(id))?;

    if request.office_id.is_some() || request.governorate_id.is_some() {
        let office_id = request.office_id.unwrap_or(existing.office_id);
        let governorate_id = request.governorate_id.unwrap_or(existing.governorate_id);
        ensure_office_in_governorate(&mut tx, office_id, governorate_id).await?;
    }

    let profile = Profiles::new(&mut tx).update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ProfileResponse::from(profile)))
}

#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    tag = "profiles",
    summary = "Delete profile",
    responses(
        (status = 204, description = "Profile deleted successfully"),
        (status = 400, description = "Profile is still referenced by other records"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Pd"),
        (status = 404, description = "Profile not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Profile ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<ProfileId>,
    _: RequiresPermission<resource::Profiles, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(profile_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            profiles::{ProfileResponse, UserProfileResponse},
            users::Role,
        },
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_profile(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let manager = create_test_user_with_permissions(&pool, Role::Manager, &["Pc"]).await;
        let staff = create_test_user(&pool, Role::Supervisor).await;
        let governorate = create_test_governorate(&pool, "Erbil").await;
        let office = create_test_office(&pool, governorate.id, 61).await;

        let response = app
            .post("/api/v1/profiles")
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({
                "user_id": staff.id,
                "full_name": "Hana Aziz",
                "office_id": office.id,
                "governorate_id": governorate.id
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let profile: ProfileResponse = response.json();
        assert_eq!(profile.username, staff.username);
        assert_eq!(profile.office_name, "Office 61");
        assert_eq!(profile.governorate_name, "Erbil");
        assert_eq!(profile.position, None);

        // One profile per user
        let response = app
            .post("/api/v1/profiles")
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({
                "user_id": staff.id,
                "full_name": "Hana Aziz",
                "office_id": office.id,
                "governorate_id": governorate.id
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_office_must_be_in_governorate(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let manager = create_test_user_with_permissions(&pool, Role::Manager, &["Pc", "Pu"]).await;
        let site = create_test_site(&pool).await;
        let elsewhere = create_test_governorate(&pool, "Sulaymaniyah").await;
        let staff = create_test_user(&pool, Role::Supervisor).await;

        let response = app
            .post("/api/v1/profiles")
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({
                "user_id": staff.id,
                "full_name": "Omar Saleh",
                "office_id": site.office.id,
                "governorate_id": elsewhere.id
            }))
            .await;
        response.assert_status_bad_request();

        let response = app
            .put(&format!("/api/v1/profiles/{}", site.profile.id))
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({"governorate_id": elsewhere.id}))
            .await;
        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_profile_keeps_unsupplied_fields(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let manager = create_test_user_with_permissions(&pool, Role::Manager, &["Pu"]).await;
        let site = create_test_site(&pool).await;

        let response = app
            .put(&format!("/api/v1/profiles/{}", site.profile.id))
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({"id": site.profile.id, "position": "Head Clerk"}))
            .await;
        response.assert_status_ok();
        let profile: ProfileResponse = response.json();
        assert_eq!(profile.position.as_deref(), Some("Head Clerk"));
        assert_eq!(profile.full_name, "Test Staff Member");
        assert_eq!(profile.office_id, site.office.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_profiles(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let reader = create_test_user_with_permissions(&pool, Role::Supervisor, &["Pr"]).await;
        let first = create_test_site(&pool).await;
        create_test_site(&pool).await;

        let response = app
            .post("/api/v1/profiles/search")
            .add_header("authorization", bearer_token(&reader))
            .json(&json!({"office_id": first.office.id}))
            .await;
        response.assert_status_ok();
        let profiles: Vec<ProfileResponse> = response.json();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, first.profile.id);

        // An empty body matches every profile
        let response = app
            .post("/api/v1/profiles/search")
            .add_header("authorization", bearer_token(&reader))
            .json(&json!({}))
            .await;
        let profiles: Vec<ProfileResponse> = response.json();
        assert_eq!(profiles.len(), 2);

        let response = app
            .post("/api/v1/profiles/search")
            .add_header("authorization", bearer_token(&reader))
            .json(&json!({"full_name": "staff", "pageSize": "1"}))
            .await;
        let profiles: Vec<ProfileResponse> = response.json();
        assert_eq!(profiles.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_own_profile_needs_no_permission(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let site = create_test_site(&pool).await;
        let stranger = create_test_user(&pool, Role::Supervisor).await;

        let response = app
            .get(&format!("/api/v1/profiles/user/{}", site.user.id))
            .add_header("authorization", bearer_token(&site.user))
            .await;
        response.assert_status_ok();
        let profile: UserProfileResponse = response.json();
        assert_eq!(profile.profile_id, site.profile.id);
        assert_eq!(profile.office_id, site.office.id);

        let response = app
            .get(&format!("/api/v1/profiles/user/{}", site.user.id))
            .add_header("authorization", bearer_token(&stranger))
            .await;
        response.assert_status_forbidden();

        let response = app
            .get(&format!("/api/v1/profiles/user/{}", stranger.id))
            .add_header("authorization", bearer_token(&stranger))
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_profile(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let manager = create_test_user_with_permissions(&pool, Role::Manager, &["Pd", "Pr"]).await;
        let site = create_test_site(&pool).await;

        let response = app
            .delete(&format!("/api/v1/profiles/{}", site.profile.id))
            .add_header("authorization", bearer_token(&manager))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get(&format!("/api/v1/profiles/{}", site.profile.id))
            .add_header("authorization", bearer_token(&manager))
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_full_name_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let manager = create_test_user_with_permissions(&pool, Role::Manager, &["Pc", "Pu"]).await;
        let staff = create_test_user(&pool, Role::Supervisor).await;
        let site = create_test_site(&pool).await;

        let response = app
            .post("/api/v1/profiles")
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({
                "user_id": staff.id,
                "full_name": "f".repeat(201),
                "office_id": site.office.id,
                "governorate_id": site.governorate.id
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Value exceeds the maximum length of 200 characters");

        let response = app
            .put(&format!("/api/v1/profiles/{}", site.profile.id))
            .add_header("authorization", bearer_token(&manager))
            .json(&json!({"position": "p".repeat(101)}))
            .await;
        response.assert_status_bad_request();
    }
}
