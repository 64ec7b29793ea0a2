use crate::api::handlers::{ensure_matching_id, profiles::ensure_office_in_governorate};
use crate::api::models::pagination::PagedList;
use crate::api::models::profiles::UserProfileResponse;
use crate::api::models::users::{CurrentUser, ListUsersQuery, Role, UserCreate, UserResponse, UserUpdate, parse_roles};
use crate::auth::permissions::{RequiresPermission, is_known_permission, operation, require_permission, resource};
use crate::db::handlers::{Profiles, Repository, Users, users::UserFilter};
use crate::db::models::profiles::{ProfileCreateDBRequest, ProfileUpdateDBRequest};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{GovernorateId, OfficeId, Operation, Resource};
use crate::{AppState, types::UserId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgConnection;
use tracing::info;

fn user_not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

/// Admin and SuperAdmin can only be granted by a SuperAdmin
fn check_role_assignment(current_user: &CurrentUser, roles: &[Role]) -> Result<()> {
    if !current_user.is_super_admin() && roles.iter().any(Role::is_privileged) {
        return Err(Error::Forbidden {
            message: "Only a SuperAdmin can assign the Admin or SuperAdmin roles".to_string(),
        });
    }
    Ok(())
}

/// Admin and SuperAdmin accounts can only be changed by a SuperAdmin
fn check_target(current_user: &CurrentUser, target: &UserDBResponse) -> Result<()> {
    if !current_user.is_super_admin() && target.roles.iter().any(Role::is_privileged) {
        return Err(Error::Forbidden {
            message: "Only a SuperAdmin can modify Admin or SuperAdmin users".to_string(),
        });
    }
    Ok(())
}

fn validate_permissions(permissions: &[String]) -> Result<Vec<String>> {
    let mut validated = Vec::with_capacity(permissions.len());
    for permission in permissions {
        let code = permission.trim();
        if !is_known_permission(code) {
            return Err(Error::BadRequest {
                message: format!("Permission '{permission}' does not exist"),
            });
        }
        if !validated.iter().any(|p| p == code) {
            validated.push(code.to_string());
        }
    }
    Ok(validated)
}

fn required_text(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    Ok(value.to_string())
}

async fn ensure_username_available(conn: &mut PgConnection, username: &str, user_id: Option<UserId>) -> Result<()> {
    match Users::new(conn).get_by_username(username).await? {
        Some(existing) if Some(existing.id) != user_id => Err(Error::Conflict {
            message: format!("Username '{username}' is already taken"),
        }),
        _ => Ok(()),
    }
}

async fn load_profile(conn: &mut PgConnection, user_id: UserId) -> Result<Option<UserProfileResponse>> {
    let profile = Profiles::new(conn).get_by_user_id(user_id).await?;
    Ok(profile.map(UserProfileResponse::from))
}

/// Profile fields that may accompany a user create or update
struct ProfileFields {
    full_name: Option<String>,
    position: Option<String>,
    office_id: Option<OfficeId>,
    governorate_id: Option<GovernorateId>,
}

impl ProfileFields {
    fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.position.is_none() && self.office_id.is_none() && self.governorate_id.is_none()
    }
}

/// Coalesce profile fields into the user's profile, creating it when none exists yet
async fn apply_profile_fields(conn: &mut PgConnection, user_id: UserId, fields: ProfileFields) -> Result<()> {
    if fields.is_empty() {
        return Ok(());
    }

    let existing = Profiles::new(&mut *conn).get_by_user_id(user_id).await?;
    match existing {
        Some(existing) => {
            let request = ProfileUpdateDBRequest {
                full_name: fields.full_name.map(|n| n.trim().to_string()),
                position: fields.position,
                office_id: fields.office_id,
                governorate_id: fields.governorate_id,
            };
            if request.office_id.is_some() || request.governorate_id.is_some() {
                let office_id = request.office_id.unwrap_or(existing.office_id);
                let governorate_id = request.governorate_id.unwrap_or(existing.governorate_id);
                ensure_office_in_governorate(&mut *conn, office_id, governorate_id).await?;
            }
            Profiles::new(&mut *conn).update(existing.id, &request).await?;
        }
        None => {
            let (Some(full_name), Some(office_id), Some(governorate_id)) = (fields.full_name, fields.office_id, fields.governorate_id)
            else {
                return Err(Error::BadRequest {
                    message: "full_name, office_id and governorate_id are required to create a profile".to_string(),
                });
            };
            ensure_office_in_governorate(&mut *conn, office_id, governorate_id).await?;
            Profiles::new(&mut *conn)
                .create(&ProfileCreateDBRequest {
                    user_id,
                    full_name: required_text(&full_name, "full_name")?,
                    position: fields.position,
                    office_id,
                    governorate_id,
                })
                .await?;
        }
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    responses(
        (status = 200, description = "Page of users; metadata in the Pagination header", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an Admin or SuperAdmin"),
        (status = 500, description = "Internal server error")
    ),
    params(ListUsersQuery),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<PagedList<UserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let filter = UserFilter {
        pagination: query.pagination,
        search: query.search,
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(UserResponse::from))
}

#[utoipa::path(
    get,
    path = "/users/current",
    tag = "users",
    summary = "Get current user",
    description = "The account behind the bearer token, with its profile when one exists.",
    responses(
        (status = 200, description = "The caller", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "The account no longer exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut pool_conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| user_not_found(current_user.id))?;
    let profile = load_profile(&mut pool_conn, user.id).await?;

    Ok(Json(UserResponse::from(user).with_profile(profile)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    description = "Allowed to administrators, and to the user themself.",
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither an administrator nor this user"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    if current_user.id != id {
        require_permission(&current_user, Resource::Users, Operation::ReadAll)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut pool_conn).get_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    let profile = load_profile(&mut pool_conn, id).await?;

    Ok(Json(UserResponse::from(user).with_profile(profile)))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Creates the account and, when full_name, office_id and governorate_id are given, its profile.",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Unknown role or permission, or invalid profile fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not assign the requested roles"),
        (status = 409, description = "Username or email already taken"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Users, operation::CreateAll>,
    Json(create): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let username = required_text(&create.username, "Username")?;
    let email = required_text(&create.email, "Email")?;
    let roles = parse_roles(&create.roles)?;
    let permissions = validate_permissions(&create.permissions)?;
    check_role_assignment(&current_user, &roles)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_username_available(&mut tx, &username, None).await?;

    let user = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            username,
            email,
            roles,
            permissions,
        })
        .await?;

    apply_profile_fields(
        &mut tx,
        user.id,
        ProfileFields {
            full_name: create.full_name,
            position: create.position,
            office_id: create.office_id,
            governorate_id: create.governorate_id,
        },
    )
    .await?;
    let profile = load_profile(&mut tx, user.id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(user_id = %user.id, created_by = %current_user.id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user).with_profile(profile))))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Only the fields present in the body are changed. Roles and permissions, when given, \
                   replace the existing sets; profile fields are merged into the user's profile.",
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "ID mismatch, unknown role or permission"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not modify this user or assign these roles"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::UpdateAll>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    ensure_matching_id(id, update.id)?;
    let roles = update.roles.as_deref().map(parse_roles).transpose()?;
    let permissions = update.permissions.as_deref().map(validate_permissions).transpose()?;
    if let Some(roles) = &roles {
        check_role_assignment(&current_user, roles)?;
    }
    let username = update.username.as_deref().map(|u| required_text(u, "Username")).transpose()?;
    let email = update.email.as_deref().map(|e| required_text(e, "Email")).transpose()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let target = Users::new(&mut tx).get_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    check_target(&current_user, &target)?;

    if let Some(username) = &username {
        ensure_username_available(&mut tx, username, Some(id)).await?;
    }

    let user = Users::new(&mut tx)
        .update(
            id,
            &UserUpdateDBRequest {
                username,
                email,
                roles,
                permissions,
            },
        )
        .await?;

    apply_profile_fields(
        &mut tx,
        id,
        ProfileFields {
            full_name: update.full_name,
            position: update.position,
            office_id: update.office_id,
            governorate_id: update.governorate_id,
        },
    )
    .await?;
    let profile = load_profile(&mut tx, id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(user_id = %id, updated_by = %current_user.id, "User updated");

    Ok(Json(UserResponse::from(user).with_profile(profile)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 400, description = "Users cannot delete themselves"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not delete this user"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::DeleteAll>,
) -> Result<StatusCode> {
    if current_user.id == id {
        return Err(Error::BadRequest {
            message: "You cannot delete your own account".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let target = Users::new(&mut tx).get_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    check_target(&current_user, &target)?;

    Users::new(&mut tx).delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!(user_id = %id, deleted_by = %current_user.id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
