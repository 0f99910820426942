use crate::models::{
    FilterReq, LoginReqDto, LoginResponse, ReportFormat, ReportQuery, SelectDateReq, SendReportReq,
    StudentHistoryQuery,
};
use crate::view::ViewKind;
use crate::view::filter::Facet;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Desk API",
        version = "1.0.0",
        description = r#"
## Attendance Desk

Operator console for a college attendance service. It loads one day of
attendance at a time, lets staff filter it, and lets admins verify the
records students submitted.

### 🔹 Key Features
- **Daily view**
  - Every record of a date, generated on demand by the attendance service
- **Pending view**
  - Records awaiting verification; approve or decline one, or all visible ones
- **Filters**
  - Department, year and status facets built from the loaded records
- **Reports**
  - PDF or CSV download of the daily view, or the PDF mailed through the attendance service
- **Student history**
  - Paginated per-student attendance over a date range

### 🔐 Security
Endpoints under `/api` need a **JWT Bearer** token from `/auth/login`.
Verification actions are limited to **Admin** operators.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::profile,

        crate::api::attendance::get_view,
        crate::api::attendance::select_date,
        crate::api::attendance::set_filter,
        crate::api::attendance::approve,
        crate::api::attendance::decline,
        crate::api::attendance::approve_all,
        crate::api::attendance::decline_all,

        crate::api::report::download_daily,
        crate::api::report::email_daily,

        crate::api::student::student_attendance
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            SelectDateReq,
            FilterReq,
            SendReportReq,
            ReportQuery,
            ReportFormat,
            StudentHistoryQuery,
            Facet,
            ViewKind
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Operator login and profile"),
        (name = "Views", description = "Daily and pending attendance views"),
        (name = "Reports", description = "Attendance reports"),
        (name = "Students", description = "Per-student attendance history"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}
