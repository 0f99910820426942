use std::sync::Arc;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::model::role::Role;
use crate::view::Session;

/// The caller's live session, put in request extensions by `auth_middleware`.
#[derive(Clone)]
pub struct AuthSession(pub Arc<Session>);

impl FromRequest for AuthSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthSession>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("No session")),
        )
    }
}

impl std::ops::Deref for AuthSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl AuthSession {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role() == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }
}
