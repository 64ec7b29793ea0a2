//! Database models for staff profiles.

use crate::api::models::profiles::{ProfileCreate, ProfileUpdate};
use crate::types::{GovernorateId, OfficeId, ProfileId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ProfileCreateDBRequest {
    pub user_id: UserId,
    pub full_name: String,
    pub position: Option<String>,
    pub office_id: OfficeId,
    pub governorate_id: GovernorateId,
}

impl From<ProfileCreate> for ProfileCreateDBRequest {
    fn from(api: ProfileCreate) -> Self {
        Self {
            user_id: api.user_id,
            full_name: api.full_name.trim().to_string(),
            position: api.position,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateDBRequest {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
}

impl ProfileUpdateDBRequest {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.position.is_none() && self.office_id.is_none() && self.governorate_id.is_none()
    }
}

impl From<ProfileUpdate> for ProfileUpdateDBRequest {
    fn from(api: ProfileUpdate) -> Self {
        Self {
            full_name: api.full_name.map(|n| n.trim().to_string()),
            position: api.position,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileDBResponse {
    pub id: ProfileId,
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub position: Option<String>,
    pub office_id: OfficeId,
    pub office_name: String,
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
