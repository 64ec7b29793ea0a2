//! Database models shared by every list-of-values table.

use crate::api::models::lov::{LovCreate, LovUpdate};
use crate::types::LovId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct LovCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<LovCreate> for LovCreateDBRequest {
    fn from(api: LovCreate) -> Self {
        Self {
            name: api.name.trim().to_string(),
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LovUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<LovUpdate> for LovUpdateDBRequest {
    fn from(api: LovUpdate) -> Self {
        Self {
            name: api.name.map(|n| n.trim().to_string()),
            description: api.description,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LovDBResponse {
    pub id: LovId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
