use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::auth::AuthSession;
use crate::error::MutationError;
use crate::models::{FilterReq, SelectDateReq};
use crate::view::reconcile::ReconcileOutcome;
use crate::view::{ViewKind, ViewSnapshot};

/// Current snapshot of a view
#[utoipa::path(
    get,
    path = "/api/views/{kind}",
    params(("kind" = ViewKind, Path, description = "daily or pending")),
    responses(
        (status = 200, description = "View snapshot", body = Object, example = json!({
            "view": "daily",
            "status": "Ready",
            "date": "2025-03-03",
            "records": [],
            "facets": { "departments": ["CSE"], "years": ["2"], "statuses": ["Present"] },
            "filteredRecords": [],
            "selection": { "department": "All", "year": "All", "status": "All" }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn get_view(auth: AuthSession, kind: web::Path<ViewKind>) -> impl Responder {
    HttpResponse::Ok().json(auth.view(*kind).snapshot())
}

/// Select a date and load its attendance
///
/// A failed fetch still answers 200; the snapshot carries `status = Failed`.
#[utoipa::path(
    post,
    path = "/api/views/{kind}/date",
    params(("kind" = ViewKind, Path, description = "daily or pending")),
    request_body = SelectDateReq,
    responses(
        (status = 200, description = "View snapshot after the fetch settled", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn select_date(
    auth: AuthSession,
    kind: web::Path<ViewKind>,
    body: web::Json<SelectDateReq>,
) -> impl Responder {
    let snapshot = auth.view(*kind).select_date(body.date).await;
    HttpResponse::Ok().json(snapshot)
}

/// Change one filter facet
#[utoipa::path(
    put,
    path = "/api/views/{kind}/filter",
    params(("kind" = ViewKind, Path, description = "daily or pending")),
    request_body = FilterReq,
    responses(
        (status = 200, description = "View snapshot with the new selection", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn set_filter(
    auth: AuthSession,
    kind: web::Path<ViewKind>,
    body: web::Json<FilterReq>,
) -> impl Responder {
    HttpResponse::Ok().json(auth.view(*kind).set_filter(body.facet, &body.value))
}

/// Approve one pending record
#[utoipa::path(
    put,
    path = "/api/views/pending/{id}/approve",
    params(("id" = String, Path, description = "Attendance record id")),
    responses(
        (status = 200, description = "Record approved", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record not in the pending view"),
        (status = 409, description = "A decision for this record is already in flight"),
        (status = 502, description = "Attendance service refused the update", body = Object, example = json!({
            "error": "record 65f0c1 could not be updated: attendance service returned 500: oops",
            "snapshot": {}
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn approve(auth: AuthSession, id: web::Path<String>) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let result = auth.pending.approve(&id, &auth.acting_user()).await;
    Ok(mutation_response(&auth, result))
}

/// Decline one pending record
#[utoipa::path(
    put,
    path = "/api/views/pending/{id}/decline",
    params(("id" = String, Path, description = "Attendance record id")),
    responses(
        (status = 200, description = "Record declined", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record not in the pending view"),
        (status = 409, description = "A decision for this record is already in flight"),
        (status = 502, description = "Attendance service refused the update", body = Object)
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn decline(auth: AuthSession, id: web::Path<String>) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let result = auth.pending.decline(&id, &auth.acting_user()).await;
    Ok(mutation_response(&auth, result))
}

fn mutation_response(auth: &AuthSession, result: Result<ViewSnapshot, MutationError>) -> HttpResponse {
    match result {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e @ MutationError::UnknownRecord(_)) => {
            HttpResponse::NotFound().json(json!({ "error": e.to_string() }))
        }
        Err(e @ MutationError::InFlight(_)) => {
            HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
        }
        Err(e @ MutationError::Remote { .. }) => {
            warn!(error = %e, user_id = %auth.profile.id, "Verification update failed");
            HttpResponse::BadGateway().json(json!({
                "error": e.to_string(),
                "snapshot": auth.pending.snapshot(),
            }))
        }
    }
}

/// Approve every record of the filtered pending view
#[utoipa::path(
    put,
    path = "/api/views/pending/approve-all",
    responses(
        (status = 200, description = "Per-record outcome and resulting view", body = Object, example = json!({
            "outcome": { "decision": "approve", "succeeded": ["1", "2"], "failed": [{ "id": "3", "reason": "..." }] },
            "snapshot": {}
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn approve_all(auth: AuthSession) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (outcome, snapshot) = auth.pending.approve_all(&auth.acting_user()).await;
    Ok(bulk_response(&auth, outcome, snapshot))
}

/// Decline every record of the filtered pending view
#[utoipa::path(
    put,
    path = "/api/views/pending/decline-all",
    responses(
        (status = 200, description = "Per-record outcome and resulting view", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn decline_all(auth: AuthSession) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (outcome, snapshot) = auth.pending.decline_all(&auth.acting_user()).await;
    Ok(bulk_response(&auth, outcome, snapshot))
}

fn bulk_response(auth: &AuthSession, outcome: ReconcileOutcome, snapshot: ViewSnapshot) -> HttpResponse {
    if outcome.is_complete_success() {
        info!(user_id = %auth.profile.id, count = outcome.succeeded.len(), "Bulk verification done");
    } else {
        warn!(
            user_id = %auth.profile.id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk verification partially failed"
        );
    }
    HttpResponse::Ok().json(json!({ "outcome": outcome, "snapshot": snapshot }))
}
