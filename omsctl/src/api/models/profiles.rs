//! API request/response models for staff profiles.

use super::pagination::PaginationParams;
use crate::db::models::profiles::ProfileDBResponse;
use crate::types::{GovernorateId, OfficeId, ProfileId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileCreate {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub full_name: String,
    pub position: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<ProfileId>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProfileId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub position: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub office_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's profile as shown alongside their account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
    pub full_name: String,
    pub position: Option<String>,
    pub governorate_name: String,
    pub office_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
}

/// Search body for profiles; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileSearch {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    /// Case-insensitive substring match on the full name
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            username: db.username,
            full_name: db.full_name,
            position: db.position,
            office_id: db.office_id,
            office_name: db.office_name,
            governorate_id: db.governorate_id,
            governorate_name: db.governorate_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<ProfileDBResponse> for UserProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            profile_id: db.id,
            full_name: db.full_name,
            position: db.position,
            governorate_name: db.governorate_name,
            office_name: db.office_name,
            user_id: db.user_id,
            governorate_id: db.governorate_id,
            office_id: db.office_id,
        }
    }
}
