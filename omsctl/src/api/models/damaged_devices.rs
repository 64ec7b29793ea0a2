//! API request/response models for damaged devices.

use super::pagination::PaginationParams;
use crate::db::models::damaged_devices::{DamagedDeviceDBResponse, TypeCountDBResponse};
use crate::types::{DamagedDeviceId, GovernorateId, LovId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DamagedDeviceCreate {
    pub serial_number: String,
    pub date: NaiveDate,
    #[schema(value_type = String, format = "uuid")]
    pub damaged_device_type_id: LovId,
    #[schema(value_type = String, format = "uuid")]
    pub device_type_id: LovId,
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DamagedDeviceUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<DamagedDeviceId>,
    pub serial_number: Option<String>,
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub damaged_device_type_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub device_type_id: Option<LovId>,
    pub note: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DamagedDeviceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DamagedDeviceId,
    pub serial_number: String,
    pub date: NaiveDate,
    #[schema(value_type = String, format = "uuid")]
    pub damaged_device_type_id: LovId,
    pub damaged_device_type_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub device_type_id: LovId,
    pub device_type_name: String,
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub office_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
    pub profile_full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Search body for damaged devices; absent fields do not filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DamagedDeviceSearch {
    /// Case-insensitive substring match on the serial number
    pub serial_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub damaged_device_type_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub device_type_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Number of records of one lookup type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TypeCount {
    #[schema(value_type = String, format = "uuid")]
    pub type_id: LovId,
    pub type_name: String,
    pub count: i64,
}

/// Counts of the records matching a search, in total and per type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TypeStatisticsResponse {
    pub total_count: i64,
    pub by_type: Vec<TypeCount>,
}

impl TypeStatisticsResponse {
    pub fn new(by_type: Vec<TypeCount>) -> Self {
        Self {
            total_count: by_type.iter().map(|t| t.count).sum(),
            by_type,
        }
    }
}

impl From<TypeCountDBResponse> for TypeCount {
    fn from(db: TypeCountDBResponse) -> Self {
        Self {
            type_id: db.type_id,
            type_name: db.type_name,
            count: db.count,
        }
    }
}

impl From<DamagedDeviceDBResponse> for DamagedDeviceResponse {
    fn from(db: DamagedDeviceDBResponse) -> Self {
        Self {
            id: db.id,
            serial_number: db.serial_number,
            date: db.date,
            damaged_device_type_id: db.damaged_device_type_id,
            damaged_device_type_name: db.damaged_device_type_name,
            device_type_id: db.device_type_id,
            device_type_name: db.device_type_name,
            note: db.note,
            office_id: db.office_id,
            office_name: db.office_name,
            governorate_id: db.governorate_id,
            governorate_name: db.governorate_name,
            profile_id: db.profile_id,
            profile_full_name: db.profile_full_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
