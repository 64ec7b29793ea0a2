//! API request/response models for governorates.

use super::pagination::PaginationParams;
use crate::db::models::governorates::GovernorateDBResponse;
use crate::types::GovernorateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GovernorateCreate {
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GovernorateUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<GovernorateId>,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GovernorateResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: GovernorateId,
    pub name: String,
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing governorates
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListGovernoratesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,

    /// Case-insensitive substring match on the name
    pub name: Option<String>,
}

impl From<GovernorateDBResponse> for GovernorateResponse {
    fn from(db: GovernorateDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            code: db.code,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
