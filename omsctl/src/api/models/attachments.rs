//! API request/response models for attachment metadata.

use crate::db::models::attachments::AttachmentDBResponse;
use crate::errors::Error;
use crate::types::AttachmentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of record an attachment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "attachment_entity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentEntity {
    DamagedDevice,
    DamagedPassport,
    Lecture,
}

impl AttachmentEntity {
    pub const ALL: [AttachmentEntity; 3] = [
        AttachmentEntity::DamagedDevice,
        AttachmentEntity::DamagedPassport,
        AttachmentEntity::Lecture,
    ];

    /// Table holding the owning records
    pub fn table(self) -> &'static str {
        match self {
            AttachmentEntity::DamagedDevice => "damaged_devices",
            AttachmentEntity::DamagedPassport => "damaged_passports",
            AttachmentEntity::Lecture => "lectures",
        }
    }

    fn label(self) -> &'static str {
        match self {
            AttachmentEntity::DamagedDevice => "damaged device",
            AttachmentEntity::DamagedPassport => "damaged passport",
            AttachmentEntity::Lecture => "lecture",
        }
    }
}

impl fmt::Display for AttachmentEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-insensitive; `DamagedDevice`, `damaged-device` and `damaged_device` are all accepted
impl FromStr for AttachmentEntity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '-' && *c != '_').collect::<String>().to_ascii_lowercase();
        AttachmentEntity::ALL
            .into_iter()
            .find(|entity| entity.label().replace(' ', "") == normalized)
            .ok_or_else(|| Error::BadRequest {
                message: "Invalid entity type.".to_string(),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentCreate {
    pub entity_type: AttachmentEntity,
    #[schema(value_type = String, format = "uuid")]
    pub entity_id: Uuid,
    pub file_name: String,
    /// Location of the stored file, as returned by the storage the client uploaded to
    pub file_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AttachmentUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<AttachmentId>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AttachmentId,
    pub file_name: String,
    pub file_path: String,
    pub entity_type: AttachmentEntity,
    #[schema(value_type = String, format = "uuid")]
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AttachmentDBResponse> for AttachmentResponse {
    fn from(db: AttachmentDBResponse) -> Self {
        Self {
            id: db.id,
            file_name: db.file_name,
            file_path: db.file_path,
            entity_type: db.entity_type,
            entity_id: db.entity_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
