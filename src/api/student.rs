use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use crate::auth::auth::AuthSession;
use crate::model::student::DateRange;
use crate::models::StudentHistoryQuery;
use crate::remote::AttendanceApi;
use crate::utils::student_history::{self, DEFAULT_PER_PAGE};

/// Attendance history of one student, paginated
#[utoipa::path(
    get,
    path = "/api/students/{id}/attendance",
    params(
        ("id" = String, Path, description = "Student id"),
        StudentHistoryQuery
    ),
    responses(
        (status = 200, description = "One page of history", body = Object, example = json!({
            "student_name": "Asha",
            "entries": [{ "date": "2025-03-03", "status": "Present", "verified_by": "N/A", "verification_method": "face" }],
            "page": 1,
            "per_page": 5,
            "total": 1,
            "total_pages": 1
        })),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Attendance service unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn student_attendance(
    _auth: AuthSession,
    api: web::Data<Arc<dyn AttendanceApi>>,
    id: web::Path<String>,
    query: web::Query<StudentHistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let range = DateRange {
        start: query.start_date,
        end: query.end_date,
    };
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);

    let history = student_history::load(api.get_ref().as_ref(), &id, range, page, per_page)
        .await
        .map_err(|e| {
            error!(error = %e, student_id = %id, "Student history lookup failed");
            actix_web::error::ErrorBadGateway("Attendance service unavailable")
        })?;

    Ok(HttpResponse::Ok().json(history))
}
