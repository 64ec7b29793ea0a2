//! Database models for attachment metadata.

use crate::api::models::attachments::{AttachmentCreate, AttachmentEntity, AttachmentUpdate};
use crate::types::AttachmentId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AttachmentCreateDBRequest {
    pub file_name: String,
    pub file_path: String,
    pub entity_type: AttachmentEntity,
    pub entity_id: Uuid,
}

impl From<AttachmentCreate> for AttachmentCreateDBRequest {
    fn from(api: AttachmentCreate) -> Self {
        Self {
            file_name: api.file_name.trim().to_string(),
            file_path: api.file_path.trim().to_string(),
            entity_type: api.entity_type,
            entity_id: api.entity_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentUpdateDBRequest {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
}

impl From<AttachmentUpdate> for AttachmentUpdateDBRequest {
    fn from(api: AttachmentUpdate) -> Self {
        Self {
            file_name: api.file_name.map(|s| s.trim().to_string()),
            file_path: api.file_path.map(|s| s.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AttachmentDBResponse {
    pub id: AttachmentId,
    pub file_name: String,
    pub file_path: String,
    pub entity_type: AttachmentEntity,
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
