//! API request and response data models.
//!
//! These structures define the public JSON contract. They are distinct from the database models
//! in [`crate::db::models`] so storage and API representations can evolve separately, and are
//! annotated with `utoipa` for the generated OpenAPI document.
//!
//! Per resource there is a `*Create` body, a `*Update` body whose fields are all optional (an
//! `id`, when present, must match the path), a `*Response` and, for searchable resources, a
//! `*Search` body that flattens [`pagination::PaginationParams`].

pub mod attachments;
pub mod attendances;
pub mod damaged_devices;
pub mod damaged_passports;
pub mod expenses;
pub mod governorates;
pub mod lectures;
pub mod lov;
pub mod offices;
pub mod pagination;
pub mod profiles;
pub mod users;
