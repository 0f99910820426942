use std::sync::Arc;

use actix_web::{HttpResponse, Responder, http::header, web};
use serde_json::json;
use tracing::{error, info};

use crate::auth::auth::AuthSession;
use crate::error::ReportError;
use crate::models::{ReportFormat, ReportQuery, SendReportReq};
use crate::remote::AttendanceApi;
use crate::utils::report::{self, CSV_CONTENT_TYPE, CSV_FILE_NAME, PDF_CONTENT_TYPE, PDF_FILE_NAME};

/// Download the loaded daily attendance as a PDF table or CSV
#[utoipa::path(
    get,
    path = "/api/report/daily",
    params(ReportQuery),
    responses(
        (status = 200, description = "Report of the daily view", content_type = "application/pdf", body = Vec<u8>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Report could not be rendered")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn download_daily(
    auth: AuthSession,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let records = auth.daily.snapshot().records;
    let (rendered, content_type, file_name) = match query.format {
        ReportFormat::Pdf => (report::render_pdf(&records), PDF_CONTENT_TYPE, PDF_FILE_NAME),
        ReportFormat::Csv => (report::render_csv(&records), CSV_CONTENT_TYPE, CSV_FILE_NAME),
    };
    let body = rendered.map_err(|e| {
        error!(error = %e, "Rendering report failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(body))
}

/// Mail the loaded daily attendance to a list of recipients
#[utoipa::path(
    post,
    path = "/api/report/email",
    request_body = SendReportReq,
    responses(
        (status = 200, description = "Report sent", body = Object, example = json!({
            "message": "Report sent to 2 recipient(s)"
        })),
        (status = 400, description = "No recipients given"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Attendance service could not send the mail")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn email_daily(
    auth: AuthSession,
    api: web::Data<Arc<dyn AttendanceApi>>,
    body: web::Json<SendReportReq>,
) -> impl Responder {
    let SendReportReq { emails, message } = body.into_inner();
    let records = auth.daily.snapshot().records;

    match report::send_report(api.get_ref().as_ref(), &records, &emails, message).await {
        Ok(count) => {
            info!(user_id = %auth.profile.id, recipients = count, "Report mailed");
            HttpResponse::Ok().json(json!({
                "message": format!("Report sent to {count} recipient(s)")
            }))
        }
        Err(ReportError::NoRecipients) => {
            HttpResponse::BadRequest().json(json!({ "error": "At least one email is required" }))
        }
        Err(e @ ReportError::Remote(_)) => {
            error!(error = %e, "Mailing report failed");
            HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
        }
        Err(e) => {
            error!(error = %e, "Rendering report failed");
            HttpResponse::InternalServerError().finish()
        }
    }
}
