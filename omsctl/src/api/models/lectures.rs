//! API request/response models for lectures.

use super::pagination::PaginationParams;
use crate::db::models::lectures::LectureDBResponse;
use crate::errors::Error;
use crate::types::{GovernorateId, LectureId, LovId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_NOTE_LENGTH: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LectureCreate {
    /// At most 200 characters
    pub title: String,
    pub date: NaiveDate,
    /// At most 500 characters
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub company_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub lecture_type_id: Option<LovId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LectureUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<LectureId>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub company_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub lecture_type_id: Option<LovId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LectureResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LectureId,
    pub title: String,
    pub date: NaiveDate,
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
    #[schema(value_type = Option<String>, format = "uuid")]
    pub company_id: Option<LovId>,
    pub company_name: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub lecture_type_id: Option<LovId>,
    pub lecture_type_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Search body for lectures; absent fields do not filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LectureSearch {
    /// Case-insensitive substring match on the title
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub company_id: Option<LovId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub lecture_type_id: Option<LovId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Title and note limits shared by create and update
fn validate_text(title: Option<&str>, note: Option<&str>) -> Result<(), Error> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "Title is required.".to_string(),
            });
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::BadRequest {
                message: format!("Title must not exceed {MAX_TITLE_LENGTH} characters."),
            });
        }
    }
    if let Some(note) = note
        && note.chars().count() > MAX_NOTE_LENGTH
    {
        return Err(Error::BadRequest {
            message: format!("Note must not exceed {MAX_NOTE_LENGTH} characters."),
        });
    }
    Ok(())
}

impl LectureCreate {
    pub fn validate(&self) -> Result<(), Error> {
        validate_text(Some(&self.title), self.note.as_deref())
    }
}

impl LectureUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        validate_text(self.title.as_deref(), self.note.as_deref())
    }
}

impl From<LectureDBResponse> for LectureResponse {
    fn from(db: LectureDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            date: db.date,
            note: db.note,
            office_id: db.office_id,
            office_name: db.office_name,
            governorate_id: db.governorate_id,
            governorate_name: db.governorate_name,
            profile_id: db.profile_id,
            profile_full_name: db.profile_full_name,
            company_id: db.company_id,
            company_name: db.company_name,
            lecture_type_id: db.lecture_type_id,
            lecture_type_name: db.lecture_type_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create(title: &str, note: Option<&str>) -> LectureCreate {
        LectureCreate {
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            note: note.map(str::to_string),
            office_id: Uuid::new_v4(),
            governorate_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            company_id: None,
            lecture_type_id: None,
        }
    }

    #[test]
    fn test_title_is_required_and_bounded() {
        assert!(create("Fraud awareness", None).validate().is_ok());
        assert!(matches!(create("   ", None).validate(), Err(Error::BadRequest { .. })));
        assert!(create(&"x".repeat(200), None).validate().is_ok());
        assert!(matches!(create(&"x".repeat(201), None).validate(), Err(Error::BadRequest { .. })));
    }

    #[test]
    fn test_note_is_bounded() {
        assert!(create("t", Some(&"n".repeat(500))).validate().is_ok());
        let err = create("t", Some(&"n".repeat(501))).validate().unwrap_err();
        assert_eq!(err.user_message(), "Note must not exceed 500 characters.");
    }

    #[test]
    fn test_update_checks_only_supplied_fields() {
        assert!(LectureUpdate::default().validate().is_ok());
        let update = LectureUpdate {
            title: Some("y".repeat(201)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
