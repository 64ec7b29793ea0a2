//! API request/response models for attendance records and their statistics.

use super::pagination::PaginationParams;
use crate::db::models::attendances::{
    AttendanceDBResponse, AttendanceTotalsDBResponse, GovernorateAttendanceDBResponse, StaffTypeAvailabilityDBResponse,
    UnavailableOfficeDBResponse,
};
use crate::errors::Error;
use crate::types::{AttendanceId, GovernorateId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Shift an attendance record covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "working_hours", rename_all = "UPPERCASE")]
pub enum WorkingHours {
    Morning,
    Evening,
    Both,
}

/// One of the five staff categories counted per office and per attendance record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffType {
    ReceivingStaff,
    AccountStaff,
    PrintingStaff,
    QualityStaff,
    DeliveryStaff,
}

impl StaffType {
    /// Column holding this count in both `offices` and `attendances`
    pub fn column(&self) -> &'static str {
        match self {
            StaffType::ReceivingStaff => "receiving_staff",
            StaffType::AccountStaff => "account_staff",
            StaffType::PrintingStaff => "printing_staff",
            StaffType::QualityStaff => "quality_staff",
            StaffType::DeliveryStaff => "delivery_staff",
        }
    }
}

impl FromStr for StaffType {
    type Err = Error;

    /// Accepts `ReceivingStaff`, `receivingStaff` or `receiving_staff` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '_' && *c != '-').collect::<String>().to_ascii_lowercase();
        match normalized.as_str() {
            "receivingstaff" => Ok(StaffType::ReceivingStaff),
            "accountstaff" => Ok(StaffType::AccountStaff),
            "printingstaff" => Ok(StaffType::PrintingStaff),
            "qualitystaff" => Ok(StaffType::QualityStaff),
            "deliverystaff" => Ok(StaffType::DeliveryStaff),
            _ => Err(Error::BadRequest {
                message: format!("Invalid StaffType '{s}'."),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceCreate {
    pub date: NaiveDate,
    pub working_hours: WorkingHours,
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
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AttendanceUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<AttendanceId>,
    pub date: Option<NaiveDate>,
    pub working_hours: Option<WorkingHours>,
    pub receiving_staff: Option<i32>,
    pub account_staff: Option<i32>,
    pub printing_staff: Option<i32>,
    pub quality_staff: Option<i32>,
    pub delivery_staff: Option<i32>,
    pub note: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AttendanceId,
    pub date: NaiveDate,
    pub working_hours: WorkingHours,
    pub receiving_staff: i32,
    pub account_staff: i32,
    pub printing_staff: i32,
    pub quality_staff: i32,
    pub delivery_staff: i32,
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

/// Search body for attendance records; absent fields do not filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSearch {
    pub working_hours: Option<WorkingHours>,
    /// Records on or after this date
    pub start_date: Option<NaiveDate>,
    /// Records on or before this date
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Summed staff counts per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StaffCounts {
    pub receiving_staff: i64,
    pub account_staff: i64,
    pub printing_staff: i64,
    pub quality_staff: i64,
    pub delivery_staff: i64,
    pub total: i64,
}

impl StaffCounts {
    pub fn new(receiving_staff: i64, account_staff: i64, printing_staff: i64, quality_staff: i64, delivery_staff: i64) -> Self {
        Self {
            receiving_staff,
            account_staff,
            printing_staff,
            quality_staff,
            delivery_staff,
            total: receiving_staff + account_staff + printing_staff + quality_staff + delivery_staff,
        }
    }
}

/// Aggregate over every record matching an attendance search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceStatisticsResponse {
    pub record_count: i64,
    pub staff: StaffCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeAttendanceStatisticsQuery {
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub working_hours: Option<WorkingHours>,
}

/// An office's configured staffing against what its attendance records report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficeAttendanceStatisticsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub office_name: String,
    pub record_count: i64,
    pub expected_staff: StaffCounts,
    pub attended_staff: StaffCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GovernorateAttendanceStatisticsQuery {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    pub date: Option<NaiveDate>,
    pub working_hours: Option<WorkingHours>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GovernorateAttendanceStatisticsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub office_count: i64,
    /// Offices with at least one matching attendance record
    pub reporting_office_count: i64,
    pub attended_staff: StaffCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnavailableOfficesQuery {
    pub date: NaiveDate,
    pub working_hours: Option<WorkingHours>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnavailableOffice {
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub office_name: String,
    pub office_code: i32,
    pub governorate_name: String,
}

/// Offices that have not recorded attendance for a date
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnavailableOfficesResponse {
    pub message: String,
    pub unavailable_offices: Vec<UnavailableOffice>,
}

impl UnavailableOfficesResponse {
    pub fn new(unavailable_offices: Vec<UnavailableOffice>) -> Self {
        let message = if unavailable_offices.is_empty() {
            "All offices have attendance."
        } else {
            "Unavailable offices retrieved successfully."
        };
        Self {
            message: message.to_string(),
            unavailable_offices,
        }
    }
}

/// Body for per-office availability of one staff category
///
/// `staff_type` and `date` are required; they are optional here so that a missing value is
/// reported as a bad request rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StaffTypeStatisticsQuery {
    /// One of ReceivingStaff, AccountStaff, PrintingStaff, QualityStaff, DeliveryStaff
    pub staff_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub working_hours: Option<WorkingHours>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaffTypeStatisticsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub office_name: String,
    pub governorate_name: String,
    /// Configured staff of this type
    pub expected: i64,
    /// Staff of this type reported present
    pub available: i64,
}

impl From<AttendanceDBResponse> for AttendanceResponse {
    fn from(db: AttendanceDBResponse) -> Self {
        Self {
            id: db.id,
            date: db.date,
            working_hours: db.working_hours,
            receiving_staff: db.receiving_staff,
            account_staff: db.account_staff,
            printing_staff: db.printing_staff,
            quality_staff: db.quality_staff,
            delivery_staff: db.delivery_staff,
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

impl From<AttendanceTotalsDBResponse> for AttendanceStatisticsResponse {
    fn from(db: AttendanceTotalsDBResponse) -> Self {
        Self {
            record_count: db.record_count,
            staff: StaffCounts::new(
                db.receiving_staff,
                db.account_staff,
                db.printing_staff,
                db.quality_staff,
                db.delivery_staff,
            ),
        }
    }
}

impl From<GovernorateAttendanceDBResponse> for GovernorateAttendanceStatisticsResponse {
    fn from(db: GovernorateAttendanceDBResponse) -> Self {
        Self {
            governorate_id: db.governorate_id,
            governorate_name: db.governorate_name,
            office_count: db.office_count,
            reporting_office_count: db.reporting_office_count,
            attended_staff: StaffCounts::new(
                db.receiving_staff,
                db.account_staff,
                db.printing_staff,
                db.quality_staff,
                db.delivery_staff,
            ),
        }
    }
}

impl From<UnavailableOfficeDBResponse> for UnavailableOffice {
    fn from(db: UnavailableOfficeDBResponse) -> Self {
        Self {
            office_id: db.office_id,
            office_name: db.office_name,
            office_code: db.office_code,
            governorate_name: db.governorate_name,
        }
    }
}

impl From<StaffTypeAvailabilityDBResponse> for StaffTypeStatisticsResponse {
    fn from(db: StaffTypeAvailabilityDBResponse) -> Self {
        Self {
            office_id: db.office_id,
            office_name: db.office_name,
            governorate_name: db.governorate_name,
            expected: db.expected,
            available: db.available,
        }
    }
}
