//! Database models for attendance records.

use crate::api::models::attendances::{AttendanceCreate, AttendanceUpdate, WorkingHours};
use crate::types::{AttendanceId, GovernorateId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct AttendanceCreateDBRequest {
    pub date: NaiveDate,
    pub working_hours: WorkingHours,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub governorate_id: GovernorateId,
    pub profile_id: ProfileId,
}

impl From<AttendanceCreate> for AttendanceCreateDBRequest {
    fn from(api: AttendanceCreate) -> Self {
        Self {
            date: api.date,
            working_hours: api.working_hours,
            receiving_staff: api.receiving_staff,
            account_staff: api.account_staff,
            printing_staff: api.printing_staff,
            quality_staff: api.quality_staff,
            delivery_staff: api.delivery_staff,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceUpdateDBRequest {
    pub date: Option<NaiveDate>,
    pub working_hours: Option<WorkingHours>,
    pub receiving_staff: Option<i32>,
    pub account_staff: Option<i32>,
    pub printing_staff: Option<i32>,
    pub quality_staff: Option<i32>,
    pub delivery_staff: Option<i32>,
    pub note: Option<String>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
}

impl From<AttendanceUpdate> for AttendanceUpdateDBRequest {
    fn from(api: AttendanceUpdate) -> Self {
        Self {
            date: api.date,
            working_hours: api.working_hours,
            receiving_staff: api.receiving_staff,
            account_staff: api.account_staff,
            printing_staff: api.printing_staff,
            quality_staff: api.quality_staff,
            delivery_staff: api.delivery_staff,
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendanceDBResponse {
    pub id: AttendanceId,
    pub date: NaiveDate,
    pub working_hours: WorkingHours,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
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

/// Record count and summed staff over a set of attendance records
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceTotalsDBResponse {
    pub record_count: i64,
    pub receiving_staff: i64,
    pub account_staff: i64,
    pub printing_staff: i64,
    pub quality_staff: i64,
    pub delivery_staff: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct GovernorateAttendanceDBResponse {
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub office_count: i64,
    pub reporting_office_count: i64,
    pub receiving_staff: i64,
    pub account_staff: i64,
    pub printing_staff: i64,
    pub quality_staff: i64,
    pub delivery_staff: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct UnavailableOfficeDBResponse {
    pub office_id: OfficeId,
    pub office_name: String,
    pub office_code: i32,
    pub governorate_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct StaffTypeAvailabilityDBResponse {
    pub office_id: OfficeId,
    pub office_name: String,
    pub governorate_name: String,
    pub expected: i64,
    pub available: i64,
}
