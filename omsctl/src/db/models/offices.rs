//! Database models for offices.

use crate::api::models::offices::{OfficeCreate, OfficeUpdate};
use crate::types::{GovernorateId, OfficeId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct OfficeCreateDBRequest {
    pub name: String,
    pub code: i32,
    pub governorate_id: GovernorateId,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
}

impl From<OfficeCreate> for OfficeCreateDBRequest {
    fn from(api: OfficeCreate) -> Self {
        Self {
            name: api.name.trim().to_string(),
            code: api.code,
            governorate_id: api.governorate_id,
            receiving_staff: api.receiving_staff,
            account_staff: api.account_staff,
            printing_staff: api.printing_staff,
            quality_staff: api.quality_staff,
            delivery_staff: api.delivery_staff,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfficeUpdateDBRequest {
    pub name: Option<String>,
    pub code: Option<i32>,
    pub governorate_id: Option<GovernorateId>,
    pub receiving_staff: Option<i32>,
    pub account_staff: Option<i32>,
    pub printing_staff: Option<i32>,
    pub quality_staff: Option<i32>,
    pub delivery_staff: Option<i32>,
}

impl From<OfficeUpdate> for OfficeUpdateDBRequest {
    fn from(api: OfficeUpdate) -> Self {
        Self {
            name: api.name.map(|n| n.trim().to_string()),
            code: api.code,
            governorate_id: api.governorate_id,
            receiving_staff: api.receiving_staff,
            account_staff: api.account_staff,
            printing_staff: api.printing_staff,
            quality_staff: api.quality_staff,
            delivery_staff: api.delivery_staff,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OfficeDBResponse {
    pub id: OfficeId,
    pub name: String,
    pub code: i32,
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OfficeStatisticsDBResponse {
    pub id: OfficeId,
    pub name: String,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
}
