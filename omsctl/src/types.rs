//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, OfficeId, etc.)
//! - Resource and operation enums for access control
//! - The [`Permission`] requirement reported when access is denied
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety.
//!
//! # Permission System
//!
//! Access control pairs a [`Resource`] with an [`Operation`]. Each pair maps to a short
//! permission code (for example `Ar` for reading attendance records) that must be present in
//! the caller's granted permissions. See [`crate::auth::permissions`] for the mapping.
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

use crate::api::models::users::Role;

// Type aliases for IDs
pub type UserId = Uuid;
pub type ProfileId = Uuid;
pub type GovernorateId = Uuid;
pub type OfficeId = Uuid;
pub type AttendanceId = Uuid;
pub type DamagedDeviceId = Uuid;
pub type DamagedPassportId = Uuid;
pub type LectureId = Uuid;
pub type LovId = Uuid;
pub type AttachmentId = Uuid;
pub type MonthlyExpensesId = Uuid;
pub type DailyExpenseId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    ReadAll,
    UpdateAll,
    DeleteAll,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Profiles,
    Governorates,
    Offices,
    OfficeStatistics,
    Attendances,
    AttendanceStatistics,
    DamagedDevices,
    DamagedDeviceStatistics,
    DamagedPassports,
    DamagedPassportStatistics,
    Lectures,
    Attachments,
    Expenses,
    DamagedTypes,
    DamagedDeviceTypes,
    DeviceTypes,
    Companies,
    LectureTypes,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Caller must hold one of the listed roles
    Role(Vec<Role>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll => write!(f, "create"),
            Operation::ReadAll => write!(f, "read"),
            Operation::UpdateAll => write!(f, "update"),
            Operation::DeleteAll => write!(f, "delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Users => "users",
            Resource::Profiles => "profiles",
            Resource::Governorates => "governorates",
            Resource::Offices => "offices",
            Resource::OfficeStatistics => "office statistics",
            Resource::Attendances => "attendances",
            Resource::AttendanceStatistics => "attendance statistics",
            Resource::DamagedDevices => "damaged devices",
            Resource::DamagedDeviceStatistics => "damaged device statistics",
            Resource::DamagedPassports => "damaged passports",
            Resource::DamagedPassportStatistics => "damaged passport statistics",
            Resource::Lectures => "lectures",
            Resource::Attachments => "attachments",
            Resource::Expenses => "expenses",
            Resource::DamagedTypes => "damaged types",
            Resource::DamagedDeviceTypes => "damaged device types",
            Resource::DeviceTypes => "device types",
            Resource::Companies => "companies",
            Resource::LectureTypes => "lecture types",
        };
        f.write_str(name)
    }
}
