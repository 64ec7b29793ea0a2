//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Every route is nested under `/api/v1`:
//!
//! - **Users** (`/users/*`): Accounts, roles and permission codes
//! - **Organisation** (`/governorates/*`, `/offices/*`, `/profiles/*`): Governorates, their offices
//!   and the staff profiled in them
//! - **Attendance** (`/attendances/*`): Daily attendance records and staffing statistics
//! - **Damage reports** (`/damaged-devices/*`, `/damaged-passports/*`): Reports and per-type counts
//! - **Lectures** (`/lectures/*`): Lectures held at offices
//! - **Lists of values** (`/lov/{kind}/*`): Lookup tables such as companies and device types
//! - **Attachments** (`/attachments/*`): File metadata attached to reports and lectures
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
