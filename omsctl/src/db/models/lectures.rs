//! Database models for lectures.

use crate::api::models::lectures::{LectureCreate, LectureUpdate};
use crate::types::{GovernorateId, LectureId, LovId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct LectureCreateDBRequest {
    pub title: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub governorate_id: GovernorateId,
    pub profile_id: ProfileId,
    pub company_id: Option<LovId>,
    pub lecture_type_id: Option<LovId>,
}

impl From<LectureCreate> for LectureCreateDBRequest {
    fn from(api: LectureCreate) -> Self {
        Self {
            title: api.title.trim().to_string(),
            date: api.date,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
            company_id: api.company_id,
            lecture_type_id: api.lecture_type_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LectureUpdateDBRequest {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
    pub company_id: Option<LovId>,
    pub lecture_type_id: Option<LovId>,
}

impl From<LectureUpdate> for LectureUpdateDBRequest {
    fn from(api: LectureUpdate) -> Self {
        Self {
            title: api.title.map(|t| t.trim().to_string()),
            date: api.date,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
            company_id: api.company_id,
            lecture_type_id: api.lecture_type_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LectureDBResponse {
    pub id: LectureId,
    pub title: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub office_name: String,
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub profile_id: ProfileId,
    pub profile_full_name: String,
    pub company_id: Option<LovId>,
    pub company_name: Option<String>,
    pub lecture_type_id: Option<LovId>,
    pub lecture_type_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
