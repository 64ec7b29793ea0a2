//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open transaction),
//! implements the [`Repository`] trait for the common CRUD operations and adds the
//! entity-specific queries its handlers need (statistics, lookups by natural key).
//!
//! # Available Repositories
//!
//! - [`Users`]: accounts with their roles and permission codes
//! - [`Profiles`]: staff profiles linking a user to an office and governorate
//! - [`Governorates`], [`Offices`]: the organisational tree
//! - [`Attendances`]: daily attendance records and their statistics
//! - [`DamagedDevices`], [`DamagedPassports`]: damage reports and per-type counts
//! - [`Lectures`]: lectures held at offices
//! - [`MonthlyExpenses`], [`DailyExpenses`]: office expense sheets and their entries
//! - [`Lovs`]: the list-of-values tables, one repository parameterised by kind
//! - [`Attachments`]: file metadata attached to reports and lectures
//!
//! # Filtering
//!
//! List operations take a filter type implementing [`specification::Specification`]; fields
//! left as `None` do not narrow the result.
//!
//! ```ignore
//! use omsctl::db::handlers::{Offices, Repository, offices::OfficeFilter};
//!
//! let mut conn = pool.acquire().await?;
//! let page = Offices::new(&mut conn)
//!     .list(&OfficeFilter { governorate_id: Some(id), ..Default::default() })
//!     .await?;
//! ```

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
pub mod repository;
pub mod specification;
pub mod users;

pub use attachments::Attachments;
pub use attendances::Attendances;
pub use damaged_devices::DamagedDevices;
pub use damaged_passports::DamagedPassports;
pub use expenses::{DailyExpenses, MonthlyExpenses};
pub use governorates::Governorates;
pub use lectures::Lectures;
pub use lov::Lovs;
pub use offices::Offices;
pub use profiles::Profiles;
pub use repository::Repository;
pub use users::Users;
