//! API request/response models for offices.

use super::pagination::PaginationParams;
use crate::db::models::offices::{OfficeDBResponse, OfficeStatisticsDBResponse};
use crate::types::{GovernorateId, OfficeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeCreate {
    pub name: String,
    pub code: i32,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[serde(default)]
    pub receiving_staff: i32,
    #[serde(default)]
    pub account_staff: i32,
    #[serde(default)]
    pub printing_staff: i32,
    #[serde(default)]
    pub quality_staff: i32,
    #[serde(default)]
    pub delivery_staff: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OfficeUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<OfficeId>,
    pub name: Option<String>,
    pub code: Option<i32>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    pub receiving_staff: Option<i32>,
    pub account_staff: Option<i32>,
    pub printing_staff: Option<i32>,
    pub quality_staff: Option<i32>,
    pub delivery_staff: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OfficeId,
    pub name: String,
    pub code: i32,
    #[schema(value_type = String, format = "uuid")]
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

/// Query parameters for listing offices
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListOfficesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,

    /// Only offices in this governorate
    #[param(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,

    /// Case-insensitive substring match on the office name
    pub name: Option<String>,
}

/// Configured staffing of one office
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeStatisticsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OfficeId,
    pub name: String,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
}

/// Body for office statistics across a governorate (or every office when absent)
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OfficeStatisticsQuery {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
}

impl From<OfficeDBResponse> for OfficeResponse {
    fn from(db: OfficeDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            code: db.code,
            governorate_id: db.governorate_id,
            governorate_name: db.governorate_name,
            receiving_staff: db.receiving_staff,
            account_staff: db.account_staff,
            printing_staff: db.printing_staff,
            quality_staff: db.quality_staff,
            delivery_staff: db.delivery_staff,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<OfficeStatisticsDBResponse> for OfficeStatisticsResponse {
    fn from(db: OfficeStatisticsDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            receiving_staff: db.receiving_staff,
            account_staff: db.account_staff,
            printing_staff: db.printing_staff,
            quality_staff: db.quality_staff,
            delivery_staff: db.delivery_staff,
        }
    }
}
