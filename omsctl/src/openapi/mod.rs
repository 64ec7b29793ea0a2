//! OpenAPI documentation for the REST API at `/api/v1/*`.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{handlers, models};

/// Bearer JWT security scheme referenced by every guarded path
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token signed with the server's secret key. Include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer <token>\n```\n\n\
                            Operators can mint a token for an existing user with `omsctl --issue-token <username>`.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Office management API")
    ),
    modifiers(&SecurityAddon),
    paths(
        handlers::users::list_users,
        handlers::users::get_current_user,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::governorates::list_governorates,
        handlers::governorates::create_governorate,
        handlers::governorates::get_governorate,
        handlers::governorates::update_governorate,
        handlers::governorates::delete_governorate,
        handlers::offices::list_offices,
        handlers::offices::create_office,
        handlers::offices::get_office,
        handlers::offices::update_office,
        handlers::offices::delete_office,
        handlers::offices::get_office_statistics,
        handlers::offices::list_office_statistics,
        handlers::profiles::list_profiles,
        handlers::profiles::search_profiles,
        handlers::profiles::create_profile,
        handlers::profiles::get_profile,
        handlers::profiles::get_profile_by_user,
        handlers::profiles::update_profile,
        handlers::profiles::delete_profile,
        handlers::attendances::list_attendances,
        handlers::attendances::search_attendances,
        handlers::attendances::create_attendance,
        handlers::attendances::get_attendance,
        handlers::attendances::update_attendance,
        handlers::attendances::delete_attendance,
        handlers::attendances::search_statistics,
        handlers::attendances::office_statistics,
        handlers::attendances::governorate_statistics,
        handlers::attendances::unavailable_offices,
        handlers::attendances::staff_type_statistics,
        handlers::damaged_devices::list_damaged_devices,
        handlers::damaged_devices::search_damaged_devices,
        handlers::damaged_devices::damaged_device_statistics,
        handlers::damaged_devices::get_damaged_devices_by_serial,
        handlers::damaged_devices::create_damaged_device,
        handlers::damaged_devices::get_damaged_device,
        handlers::damaged_devices::update_damaged_device,
        handlers::damaged_devices::delete_damaged_device,
        handlers::damaged_passports::list_damaged_passports,
        handlers::damaged_passports::search_damaged_passports,
        handlers::damaged_passports::damaged_passport_statistics,
        handlers::damaged_passports::create_damaged_passport,
        handlers::damaged_passports::get_damaged_passport,
        handlers::damaged_passports::update_damaged_passport,
        handlers::damaged_passports::delete_damaged_passport,
        handlers::lectures::list_lectures,
        handlers::lectures::search_lectures,
        handlers::lectures::create_lecture,
        handlers::lectures::get_lecture,
        handlers::lectures::update_lecture,
        handlers::lectures::delete_lecture,
        handlers::expenses::list_monthly_expenses,
        handlers::expenses::search_monthly_expenses,
        handlers::expenses::create_monthly_expenses,
        handlers::expenses::get_monthly_expenses,
        handlers::expenses::update_monthly_expenses,
        handlers::expenses::delete_monthly_expenses,
        handlers::expenses::list_daily_expenses,
        handlers::expenses::create_daily_expense,
        handlers::expenses::update_daily_expense,
        handlers::expenses::delete_daily_expense,
        handlers::lov::list_lov,
        handlers::lov::create_lov,
        handlers::lov::get_lov,
        handlers::lov::update_lov,
        handlers::lov::delete_lov,
        handlers::attachments::list_entity_attachments,
        handlers::attachments::create_attachment,
        handlers::attachments::update_attachment,
        handlers::attachments::delete_attachment,
    ),
    components(
        schemas(
            models::pagination::PaginationHeader,
            models::users::Role,
            models::users::UserCreate,
            models::users::UserUpdate,
            models::users::UserResponse,
            models::users::CurrentUser,
            models::governorates::GovernorateCreate,
            models::governorates::GovernorateUpdate,
            models::governorates::GovernorateResponse,
            models::offices::OfficeCreate,
            models::offices::OfficeUpdate,
            models::offices::OfficeResponse,
            models::offices::OfficeStatisticsQuery,
            models::offices::OfficeStatisticsResponse,
            models::profiles::ProfileCreate,
            models::profiles::ProfileUpdate,
            models::profiles::ProfileResponse,
            models::profiles::ProfileSearch,
            models::profiles::UserProfileResponse,
            models::attendances::WorkingHours,
            models::attendances::AttendanceCreate,
            models::attendances::AttendanceUpdate,
            models::attendances::AttendanceResponse,
            models::attendances::AttendanceSearch,
            models::attendances::StaffCounts,
            models::attendances::AttendanceStatisticsResponse,
            models::attendances::OfficeAttendanceStatisticsQuery,
            models::attendances::OfficeAttendanceStatisticsResponse,
            models::attendances::GovernorateAttendanceStatisticsQuery,
            models::attendances::GovernorateAttendanceStatisticsResponse,
            models::attendances::UnavailableOfficesQuery,
            models::attendances::UnavailableOffice,
            models::attendances::UnavailableOfficesResponse,
            models::attendances::StaffTypeStatisticsQuery,
            models::attendances::StaffTypeStatisticsResponse,
            models::damaged_devices::DamagedDeviceCreate,
            models::damaged_devices::DamagedDeviceUpdate,
            models::damaged_devices::DamagedDeviceResponse,
            models::damaged_devices::DamagedDeviceSearch,
            models::damaged_devices::TypeCount,
            models::damaged_devices::TypeStatisticsResponse,
            models::damaged_passports::DamagedPassportCreate,
            models::damaged_passports::DamagedPassportUpdate,
            models::damaged_passports::DamagedPassportResponse,
            models::damaged_passports::DamagedPassportSearch,
            models::lectures::LectureCreate,
            models::lectures::LectureUpdate,
            models::lectures::LectureResponse,
            models::lectures::LectureSearch,
            models::expenses::MonthlyExpensesCreate,
            models::expenses::MonthlyExpensesUpdate,
            models::expenses::MonthlyExpensesResponse,
            models::expenses::MonthlyExpensesSearch,
            models::expenses::DailyExpenseCreate,
            models::expenses::DailyExpenseUpdate,
            models::expenses::DailyExpenseResponse,
            models::lov::LovKind,
            models::lov::LovCreate,
            models::lov::LovUpdate,
            models::lov::LovResponse,
            models::attachments::AttachmentEntity,
            models::attachments::AttachmentCreate,
            models::attachments::AttachmentUpdate,
            models::attachments::AttachmentResponse,
        )
    ),
    tags(
        (name = "users", description = "Accounts, roles and permission codes. Restricted to Admin and SuperAdmin, except reading your own account."),
        (name = "governorates", description = "Top level of the organisational tree."),
        (name = "offices", description = "Offices within a governorate, with their configured staffing."),
        (name = "profiles", description = "Staff profiles linking a user to an office."),
        (name = "attendances", description = "Daily attendance records per office and working hours."),
        (name = "attendance statistics", description = "Aggregates over attendance records. Guarded by `Sa`."),
        (name = "damaged devices", description = "Damaged device reports. Counts are guarded by `Sd`."),
        (name = "damaged passports", description = "Damaged passport reports. Counts are guarded by `Sp`."),
        (name = "lectures", description = "Lectures held at offices."),
        (name = "expenses", description = "Monthly expense sheets per office and the daily expenses recorded on them."),
        (name = "lists of values", description = "Lookup tables: damaged types, damaged device types, device types, companies and lecture types.

Each kind is guarded by its own permission code (`LOVdp`, `LOVdd`, `LOVdt`, `LOVc`, `LOVlt`)."),
        (name = "attachments", description = "File metadata attached to damage reports and lectures."),
    ),
    info(
        title = "Office Management API",
        version = "1.0.0",
        description = "Back-office API for governorates, offices, staff, attendance, damage reports, lectures and office expenses.

## Authentication

Every endpoint requires a bearer token:

```
Authorization: Bearer <token>
```

A missing or invalid token yields `401`. A valid token without the permission code an endpoint requires yields `403`.

## Pagination

List and search endpoints return the page as a JSON array. Page metadata is carried in the `Pagination` response header:

```json
{\"currentPage\": 1, \"itemsPerPage\": 10, \"itemCount\": 10, \"totalItems\": 42, \"totalPages\": 5}
```

## Errors

Errors are returned as plain text with the matching status code, except conflicts, which carry a JSON body with a `message` field.",
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_path_is_guarded() {
        let doc = ApiDoc::openapi();
        assert!(doc.components.as_ref().unwrap().security_schemes.contains_key("BearerAuth"));

        for (path, item) in doc.paths.paths.iter() {
            let operations = [&item.get, &item.post, &item.put, &item.delete];
            for operation in operations.into_iter().flatten() {
                assert!(operation.security.is_some(), "{path} is missing a security requirement");
            }
        }
    }

    #[test]
    fn test_lov_paths_are_documented_once() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/lov/{kind}"));
        assert!(doc.paths.paths.contains_key("/lov/{kind}/{id}"));
        assert!(doc.paths.paths.contains_key("/attendances/search/type-statistics"));
    }
}
