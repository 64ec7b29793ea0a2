//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request deserialization and validation
//! - Authorization through the [`crate::auth::permissions::RequiresPermission`] extractor
//! - Calling the database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`attachments`]: File metadata attached to damage reports and lectures
//! - [`attendances`]: Attendance records, search and statistics
//! - [`damaged_devices`]: Damaged device reports, lookup by serial number and per-type counts
//! - [`damaged_passports`]: Damaged passport reports and per-type counts
//! - [`expenses`]: Monthly expense sheets and their daily expenses
//! - [`governorates`]: Governorate CRUD
//! - [`lectures`]: Lecture CRUD and search
//! - [`lov`]: CRUD over the list-of-values tables
//! - [`offices`]: Office CRUD and staffing statistics
//! - [`profiles`]: Staff profile CRUD and search
//! - [`users`]: User management, restricted to administrators
//!
//! # Pagination
//!
//! List and search handlers return [`crate::api::models::pagination::PagedList`], which writes
//! the page as the JSON body and the metadata into the `Pagination` header.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the matching HTTP status code.

pub mod attachments;
pub mod attendances;
pub mod damaged_devices;
pub mod damaged_passports;
pub mod expenses;
pub mod governorates;
pub mod lectures;
pub mod lov;
pub mod offices;
pub mod profiles;
pub mod users;

use crate::errors::{Error, Result};
use uuid::Uuid;

/// Reject an update body whose `id` names a different record than the path
pub(crate) fn ensure_matching_id(path_id: Uuid, body_id: Option<Uuid>) -> Result<()> {
    match body_id {
        Some(body_id) if body_id != path_id => Err(Error::BadRequest {
            message: "ID mismatch".to_string(),
        }),
        _ => Ok(()),
    }
}
