//! API request/response models for users.

use super::pagination::PaginationParams;
use super::profiles::UserProfileResponse;
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::types::{GovernorateId, OfficeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::{IntoParams, ToSchema};

// Role enum for the back-office hierarchy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Supervisor,
}

impl Role {
    /// Roles that may only be granted or managed by a SuperAdmin
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Supervisor => "Supervisor",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Role names are matched case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "superadmin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "supervisor" => Ok(Role::Supervisor),
            _ => Err(Error::BadRequest {
                message: format!("Role '{s}' does not exist"),
            }),
        }
    }
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    /// Role names, e.g. "Manager"
    #[serde(default)]
    pub roles: Vec<String>,
    /// Granted permission codes, e.g. "Ar"
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Profile fields; a profile is created when full_name, office_id and governorate_id are all given
    pub full_name: Option<String>,
    pub position: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    /// Must match the path ID when present
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<UserId>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Replaces the user's roles when present
    pub roles: Option<Vec<String>>,
    /// Replaces the user's permissions when present
    pub permissions: Option<Vec<String>>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfileResponse>,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,

    /// Case-insensitive substring match on username or email
    pub search: Option<String>,
}

/// The authenticated caller, as carried in their session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
}

impl CurrentUser {
    pub fn is_super_admin(&self) -> bool {
        self.roles.contains(&Role::SuperAdmin)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_privileged)
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            roles: db.roles,
            permissions: db.permissions,
            created_at: db.created_at,
            updated_at: db.updated_at,
            profile: None, // By default, relationships are not included
        }
    }
}

impl UserResponse {
    /// Create a response with the user's profile included
    pub fn with_profile(mut self, profile: Option<UserProfileResponse>) -> Self {
        self.profile = profile;
        self
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            roles: db.roles,
            permissions: db.permissions,
        }
    }
}

/// Parse a list of role names, rejecting unknown ones
pub fn parse_roles(names: &[String]) -> Result<Vec<Role>, Error> {
    let mut roles = names.iter().map(|n| n.parse()).collect::<Result<Vec<Role>, _>>()?;
    roles.sort();
    roles.dedup();
    Ok(roles)
}
