use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::model::attendance::{AttendanceEntry, AttendancePatch, AttendanceRecord, AttendanceStatus};
use crate::model::pagination::{AttendancePage, Pagination};
use crate::model::report::{AttendanceReport, ReportRange, ReportRow, ReportStatistics};
use crate::model::role::Role;
use crate::model::user::{UserProfile, UserSummary};
use crate::models::{AttendanceQuery, LoginReq, NotesReq, RegisterReq, ReportQuery, UpdateUserReq};
use crate::service::accounts::{IssuedToken, LoginResult, TokenIdentity};
use crate::service::session_tracker::{ClockInResult, ClockOutResult, SessionStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Workplace Attendance Tracking

Users clock in and out of daily work sessions; administrators review
everyone's attendance and produce per-user reports over a date range.

### Key Features
- **Sessions**: clock in, clock out and current status, one open session per day
- **History**: paginated own history, paginated roster for admins
- **Reports**: days worked, hours worked and averages per user
- **Accounts**: registration, login and profile updates

### Security
Every endpoint except register and login requires a **JWT Bearer** token.
Roster, report and record correction are **admin** only.

### Response Format
`{ "success": bool, "message": string, "data"?: ... }`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::verify,
        crate::auth::handlers::generate_token,
        crate::auth::handlers::update_user,
        crate::auth::handlers::list_users,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::status,
        crate::api::attendance::my_attendance,

        crate::api::report::all_users,
        crate::api::report::report,
        crate::api::report::update_record
    ),
    components(
        schemas(
            Role,
            UserProfile,
            UserSummary,
            RegisterReq,
            LoginReq,
            UpdateUserReq,
            LoginResult,
            TokenIdentity,
            IssuedToken,
            NotesReq,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceEntry,
            AttendancePatch,
            ClockInResult,
            ClockOutResult,
            SessionStatus,
            AttendanceQuery,
            ReportQuery,
            Pagination,
            AttendancePage,
            ReportRange,
            ReportRow,
            ReportStatistics,
            AttendanceReport
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and accounts"),
        (name = "Attendance", description = "Clock-in / clock-out and own history"),
        (name = "Reports", description = "Admin views and corrections"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
