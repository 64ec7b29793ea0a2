//! Database models for governorates.

use crate::api::models::governorates::{GovernorateCreate, GovernorateUpdate};
use crate::types::GovernorateId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct GovernorateCreateDBRequest {
    pub name: String,
    pub code: Option<String>,
}

impl From<GovernorateCreate> for GovernorateCreateDBRequest {
    fn from(api: GovernorateCreate) -> Self {
        Self {
            name: api.name.trim().to_string(),
            code: api.code,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GovernorateUpdateDBRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl From<GovernorateUpdate> for GovernorateUpdateDBRequest {
    fn from(api: GovernorateUpdate) -> Self {
        Self {
            name: api.name.map(|n| n.trim().to_string()),
            code: api.code,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GovernorateDBResponse {
    pub id: GovernorateId,
    pub name: String,
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
