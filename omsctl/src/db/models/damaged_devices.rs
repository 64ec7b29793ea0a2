//! Database models for damaged devices.

use crate::api::models::damaged_devices::{DamagedDeviceCreate, DamagedDeviceUpdate};
use crate::types::{DamagedDeviceId, GovernorateId, LovId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DamagedDeviceCreateDBRequest {
    pub serial_number: String,
    pub date: NaiveDate,
    pub damaged_device_type_id: LovId,
    pub device_type_id: LovId,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub governorate_id: GovernorateId,
    pub profile_id: ProfileId,
}

impl From<DamagedDeviceCreate> for DamagedDeviceCreateDBRequest {
    fn from(api: DamagedDeviceCreate) -> Self {
        Self {
            serial_number: api.serial_number.trim().to_string(),
            date: api.date,
            damaged_device_type_id: api.damaged_device_type_id,
            device_type_id: api.device_type_id,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DamagedDeviceUpdateDBRequest {
    pub serial_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub damaged_device_type_id: Option<LovId>,
    pub device_type_id: Option<LovId>,
    pub note: Option<String>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
}

impl From<DamagedDeviceUpdate> for DamagedDeviceUpdateDBRequest {
    fn from(api: DamagedDeviceUpdate) -> Self {
        Self {
            serial_number: api.serial_number.map(|s| s.trim().to_string()),
            date: api.date,
            damaged_device_type_id: api.damaged_device_type_id,
            device_type_id: api.device_type_id,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DamagedDeviceDBResponse {
    pub id: DamagedDeviceId,
    pub serial_number: String,
    pub date: NaiveDate,
    pub damaged_device_type_id: LovId,
    pub damaged_device_type_name: String,
    pub device_type_id: LovId,
    pub device_type_name: String,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub office_name: String,
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub profile_id: ProfileId,
    pub profile_full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record count for one lookup type
#[derive(Debug, Clone, FromRow)]
pub struct TypeCountDBResponse {
    pub type_id: LovId,
    pub type_name: String,
    pub count: i64,
}
