//! Authentication and authorization.
//!
//! Every request under `/api/v1` authenticates with a bearer token:
//!
//! ```text
//! Authorization: Bearer <JWT>
//! ```
//!
//! The token is an HS256 JWT signed with the configured `secret_key`. Its claims carry the
//! caller's roles and granted permission codes, so authorization is a comparison against the
//! claims and needs no database lookup. Tokens for existing users can be minted with
//! `omsctl --issue-token <username>`.
//!
//! # Authorization
//!
//! - **Permission codes**: short strings such as `Ar` (read attendances) or `LOVc` (manage
//!   companies), granted per user.
//! - **Roles**: SuperAdmin implicitly holds every permission; user management is restricted to
//!   Admin and SuperAdmin.
//!
//! See [`permissions`] for the code table.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for the authenticated caller
//! - [`permissions`]: Permission codes and the `RequiresPermission` extractor
//! - [`session`]: Token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use omsctl::auth::permissions::{operation, resource, RequiresPermission};
//!
//! async fn list_offices(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<resource::Offices, operation::ReadAll>,
//! ) -> Result<PagedList<OfficeResponse>> { ... }
//! ```

pub mod current_user;
pub mod permissions;
pub mod session;
