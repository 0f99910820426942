use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::{
    auth::{
        auth::AuthSession,
        jwt::{generate_access_token, verify_token},
    },
    config::Config,
    error::RemoteError,
    models::{LoginReqDto, LoginResponse},
    remote::AttendanceApi,
    view::SessionStore,
};

/// Operator login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 502, description = "Attendance service unavailable")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(user, api, sessions, config),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    api: web::Data<Arc<dyn AttendanceApi>>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Email and password are required"
        }));
    }

    let profile = match api.login(user.email.trim(), &user.password).await {
        Ok(profile) => profile,
        Err(e) if e.is_unauthorized() || matches!(e, RemoteError::Rejected(_)) => {
            info!(error = %e, "Invalid credentials");
            return HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }));
        }
        Err(e) => {
            error!(error = %e, "Login call failed");
            return HttpResponse::BadGateway().json(json!({
                "error": "Attendance service unavailable"
            }));
        }
    };

    let session = sessions.open(profile).await;

    let access_token = match generate_access_token(&session, &config.jwt_secret, config.access_token_ttl) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            sessions.close(&session.id).await;
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!(user_id = %session.profile.id, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        name: session.profile.name.clone(),
        role: session.role().as_str().to_string(),
    })
}

/// Ends the session behind the bearer token. Always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    sessions.close(&claims.sid).await;
    info!(user_id = %claims.sub, "Logged out");

    HttpResponse::NoContent().finish()
}

/// Profile of the logged-in operator
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Operator profile", body = Object, example = json!({
            "_id": "65f0c1", "name": "Meera", "email": "meera@college.edu", "isAdmin": true
        })),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Attendance service unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(
    auth: AuthSession,
    api: web::Data<Arc<dyn AttendanceApi>>,
) -> actix_web::Result<impl Responder> {
    let profile = api.fetch_profile(&auth.profile.id).await.map_err(|e| {
        error!(error = %e, user_id = %auth.profile.id, "Profile lookup failed");
        actix_web::error::ErrorBadGateway("Attendance service unavailable")
    })?;

    Ok(HttpResponse::Ok().json(profile))
}
