//! Permission codes and the extractor that enforces them.
//!
//! Every guarded (resource, operation) pair maps to a short permission code such as `Ar`
//! (read attendances) or `LOVc` (manage companies). A caller passes the check when the code is
//! among the permissions granted to them, or when they hold the SuperAdmin role. User management
//! has no code and is gated on the Admin/SuperAdmin roles instead.
//!
//! Handlers declare the requirement in their signature:
//!
//! ```ignore
//! async fn delete_lecture(
//!     State(state): State<AppState>,
//!     Path(id): Path<LectureId>,
//!     _: RequiresPermission<resource::Lectures, operation::DeleteAll>,
//! ) -> Result<StatusCode> { ... }
//! ```

use std::{marker::PhantomData, ops::Deref};

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Operation, Permission, Resource},
};

/// Roles allowed to manage users
pub const ADMIN_ROLES: [Role; 2] = [Role::SuperAdmin, Role::Admin];

/// Permission code guarding an operation, or `None` when the resource is role-gated.
///
/// Statistics and list-of-values resources use one code for every operation.
pub fn permission_code(resource: Resource, operation: Operation) -> Option<&'static str> {
    use Operation::*;

    let crud = |read, create, update, delete| match operation {
        ReadAll => read,
        CreateAll => create,
        UpdateAll => update,
        DeleteAll => delete,
    };

    let code = match resource {
        Resource::Users => return None,
        Resource::Attendances => crud("Ar", "Ac", "Au", "Ad"),
        Resource::DamagedPassports => crud("DPr", "DPc", "DPu", "DPd"),
        Resource::DamagedDevices => crud("DDr", "DDc", "DDu", "DDd"),
        Resource::Lectures => crud("Lr", "Lc", "Lu", "Ld"),
        Resource::Offices => crud("Or", "Oc", "Ou", "Od"),
        Resource::Governorates => crud("Gr", "Gc", "Gu", "Gd"),
        Resource::Profiles => crud("Pr", "Pc", "Pu", "Pd"),
        Resource::Attachments => crud("ATr", "ATc", "ATu", "ATd"),
        Resource::Expenses => crud("Er", "Ec", "Eu", "Ed"),
        Resource::AttendanceStatistics => "Sa",
        Resource::DamagedPassportStatistics => "Sp",
        Resource::DamagedDeviceStatistics => "Sd",
        Resource::OfficeStatistics => "So",
        Resource::DamagedTypes => "LOVdp",
        Resource::DamagedDeviceTypes => "LOVdd",
        Resource::DeviceTypes => "LOVdt",
        Resource::Companies => "LOVc",
        Resource::LectureTypes => "LOVlt",
    };
    Some(code)
}

/// Every permission code that can be granted to a user
pub const ALL_PERMISSIONS: &[&str] = &[
    "Ar", "Ac", "Au", "Ad", "DPr", "DPc", "DPu", "DPd", "DDr", "DDc", "DDu", "DDd", "Lr", "Lc", "Lu", "Ld", "Or", "Oc", "Ou", "Od",
    "Gr", "Gc", "Gu", "Gd", "Pr", "Pc", "Pu", "Pd", "ATr", "ATc", "ATu", "ATd", "Er", "Ec", "Eu", "Ed", "Sa", "Sp", "Sd", "So",
    "LOVdp", "LOVdd", "LOVdt", "LOVc", "LOVlt",
];

pub fn is_known_permission(code: &str) -> bool {
    ALL_PERMISSIONS.contains(&code)
}

/// Check whether a user may perform an operation on a resource
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    if user.is_super_admin() {
        return true;
    }
    match permission_code(resource, operation) {
        Some(code) => user.permissions.iter().any(|p| p == code),
        None => user.is_admin(),
    }
}

/// [`has_permission`], as an error suitable for returning from a handler
pub fn require_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if has_permission(user, resource, operation) {
        return Ok(());
    }
    debug!(user_id = %user.id, %resource, %operation, "Permission denied");
    let required = match permission_code(resource, operation) {
        Some(_) => Permission::Allow(resource, operation),
        None => Permission::Role(ADMIN_ROLES.to_vec()),
    };
    Err(Error::InsufficientPermissions {
        required,
        action: operation,
        resource,
    })
}

/// Type-level resources for [`RequiresPermission`]
pub mod resource {
    use crate::types::Resource;

    pub trait ResourceMarker: Send + Sync {
        const RESOURCE: Resource;
    }

    macro_rules! markers {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl ResourceMarker for $name {
                    const RESOURCE: Resource = Resource::$name;
                }
            )*
        };
    }

    markers!(
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
    );
}

/// Type-level operations for [`RequiresPermission`]
pub mod operation {
    use crate::types::Operation;

    pub trait OperationMarker: Send + Sync {
        const OPERATION: Operation;
    }

    macro_rules! markers {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl OperationMarker for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    markers!(CreateAll, ReadAll, UpdateAll, DeleteAll);
}

/// Extractor that authenticates the caller and checks one permission before the handler runs.
///
/// Rejects with 401 when no valid bearer token is present and 403 when the permission is
/// missing; in both cases the handler body, and therefore any write, never executes.
pub struct RequiresPermission<R, O> {
    user: CurrentUser,
    _marker: PhantomData<fn() -> (R, O)>,
}

impl<R, O> Deref for RequiresPermission<R, O> {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: resource::ResourceMarker,
    O: operation::OperationMarker,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require_permission(&user, R::RESOURCE, O::OPERATION)?;
        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
