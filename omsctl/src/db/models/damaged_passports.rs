//! Database models for damaged passports.

use crate::api::models::damaged_passports::{DamagedPassportCreate, DamagedPassportUpdate};
use crate::types::{DamagedPassportId, GovernorateId, LovId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DamagedPassportCreateDBRequest {
    pub passport_number: String,
    pub full_name: String,
    pub date: NaiveDate,
    pub damaged_type_id: LovId,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub governorate_id: GovernorateId,
    pub profile_id: ProfileId,
}

impl From<DamagedPassportCreate> for DamagedPassportCreateDBRequest {
    fn from(api: DamagedPassportCreate) -> Self {
        Self {
            passport_number: api.passport_number.trim().to_string(),
            full_name: api.full_name.trim().to_string(),
            date: api.date,
            damaged_type_id: api.damaged_type_id,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DamagedPassportUpdateDBRequest {
    pub passport_number: Option<String>,
    pub full_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub damaged_type_id: Option<LovId>,
    pub note: Option<String>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
}

impl From<DamagedPassportUpdate> for DamagedPassportUpdateDBRequest {
    fn from(api: DamagedPassportUpdate) -> Self {
        Self {
            passport_number: api.passport_number.map(|s| s.trim().to_string()),
            full_name: api.full_name.map(|s| s.trim().to_string()),
            date: api.date,
            damaged_type_id: api.damaged_type_id,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DamagedPassportDBResponse {
    pub id: DamagedPassportId,
    pub passport_number: String,
    pub full_name: String,
    pub date: NaiveDate,
    pub damaged_type_id: LovId,
    pub damaged_type_name: String,
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
