//! Lists of values: small name/description lookup tables.
//!
//! Every kind shares one shape and one set of endpoints under `/lov/{kind}`. The kind selects the
//! table and the permission that guards it.

use super::pagination::PaginationParams;
use crate::db::models::lov::LovDBResponse;
use crate::errors::Error;
use crate::types::{LovId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LovKind {
    DamagedTypes,
    DamagedDeviceTypes,
    DeviceTypes,
    Companies,
    LectureTypes,
}

impl LovKind {
    pub const ALL: [LovKind; 5] = [
        LovKind::DamagedTypes,
        LovKind::DamagedDeviceTypes,
        LovKind::DeviceTypes,
        LovKind::Companies,
        LovKind::LectureTypes,
    ];

    /// Backing table. Only ever pushed into SQL from this match.
    pub fn table(self) -> &'static str {
        match self {
            LovKind::DamagedTypes => "damaged_types",
            LovKind::DamagedDeviceTypes => "damaged_device_types",
            LovKind::DeviceTypes => "device_types",
            LovKind::Companies => "companies",
            LovKind::LectureTypes => "lecture_types",
        }
    }

    pub fn resource(self) -> Resource {
        match self {
            LovKind::DamagedTypes => Resource::DamagedTypes,
            LovKind::DamagedDeviceTypes => Resource::DamagedDeviceTypes,
            LovKind::DeviceTypes => Resource::DeviceTypes,
            LovKind::Companies => Resource::Companies,
            LovKind::LectureTypes => Resource::LectureTypes,
        }
    }

    /// Singular name used in messages
    pub fn display_name(self) -> &'static str {
        match self {
            LovKind::DamagedTypes => "Damaged Type",
            LovKind::DamagedDeviceTypes => "Damaged Device Type",
            LovKind::DeviceTypes => "Device Type",
            LovKind::Companies => "Company",
            LovKind::LectureTypes => "Lecture Type",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            LovKind::DamagedTypes => "damaged-types",
            LovKind::DamagedDeviceTypes => "damaged-device-types",
            LovKind::DeviceTypes => "device-types",
            LovKind::Companies => "companies",
            LovKind::LectureTypes => "lecture-types",
        }
    }
}

impl fmt::Display for LovKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for LovKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        LovKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| Error::BadRequest {
                message: format!("Unknown list of values '{s}'."),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LovCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LovUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<LovId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LovResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LovId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListLovQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,

    /// Case-insensitive substring match on the name
    pub name: Option<String>,
}

impl From<LovDBResponse> for LovResponse {
    fn from(db: LovDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
