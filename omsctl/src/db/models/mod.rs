//! Database record models matching table schemas.
//!
//! Request structs (`*CreateDBRequest`, `*UpdateDBRequest`) are built from the API models and
//! carry only what the repository writes; update requests hold `Option`s and `None` leaves the
//! column untouched. Response structs derive `sqlx::FromRow` and include the names of joined
//! rows (office, governorate, profile, lookup types) so a single query produces the API response.

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
