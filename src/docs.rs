use crate::api::attendance::{AdminStats, AttendanceReportRow, ClockResponse, LocationCheckResponse};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::leave_request::{CreateLeave, LeaveListResponse};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveListRow, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::office::{GeoPoint, OfficeConfig};
use crate::model::role::Role;
use crate::model::user::User;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by the protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geo Attendance API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance Tracker

Employees clock in and out from their phones; the reported position must lie
inside the office perimeter (haversine distance within the configured radius).

### Key Features
- **Attendance**
  - Clock in once and clock out once per local calendar day
  - Location pre-check, today's record and recent history
- **Leave Management**
  - Submit sick, vacation or other leave; admins approve or reject
- **Employee Management**
  - Admin-maintained employee profiles
- **Office Settings**
  - Office coordinates, radius and a geofence on/off switch

### Security
Every endpoint expects a **JWT Bearer** token issued by the identity provider.
Administrative operations require the `admin` role.
"#,
    ),
    paths(
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::location_check,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::user_attendance,
        crate::api::attendance::admin_today,
        crate::api::attendance::report,
        crate::api::attendance::admin_stats,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::settings::get_office,
        crate::api::settings::update_office
    ),
    components(
        schemas(
            GeoPoint,
            OfficeConfig,
            AttendanceRecord,
            AttendanceStatus,
            ClockResponse,
            LocationCheckResponse,
            AttendanceReportRow,
            AdminStats,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveListRow,
            CreateLeave,
            LeaveListResponse,
            Role,
            User,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Geofenced clock-in/clock-out and reports"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Settings", description = "Office geofence settings"),
    )
)]
pub struct ApiDoc;
