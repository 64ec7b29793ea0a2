//! API request/response models for damaged passports.

use super::pagination::PaginationParams;
use crate::db::models::damaged_passports::DamagedPassportDBResponse;
use crate::types::{DamagedPassportId, GovernorateId, LovId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DamagedPassportCreate {
    pub passport_number: String,
    pub full_name: String,
    pub date: NaiveDate,
    #[schema(value_type = String, format = "uuid")]
    pub damaged_type_id: LovId,
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DamagedPassportUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<DamagedPassportId>,
    pub passport_number: Option<String>,
    pub full_name: Option<String>,
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub damaged_type_id: Option<LovId>,
    pub note: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DamagedPassportResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DamagedPassportId,
    pub passport_number: String,
    pub full_name: String,
    pub date: NaiveDate,
    #[schema(value_type = String, format = "uuid")]
    pub damaged_type_id: LovId,
    pub damaged_type_name: String,
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

/// Search body for damaged passports; absent fields do not filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DamagedPassportSearch {
    /// Case-insensitive substring match on the passport number
    pub passport_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub damaged_type_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl From<DamagedPassportDBResponse> for DamagedPassportResponse {
    fn from(db: DamagedPassportDBResponse) -> Self {
        Self {
            id: db.id,
            passport_number: db.passport_number,
            full_name: db.full_name,
            date: db.date,
            damaged_type_id: db.damaged_type_id,
            damaged_type_name: db.damaged_type_name,
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
