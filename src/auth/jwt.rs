use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::models::Claims;
use crate::view::Session;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// Access token bound to an operator session.
pub fn generate_access_token(session: &Session, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = Claims {
        sub: session.profile.id.clone(),
        name: session.profile.name.clone(),
        is_admin: session.profile.is_admin,
        sid: session.id.clone(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::UserProfile;
    use crate::remote::stub::StubApi;
    use crate::view::SessionStore;
    use crate::view::reconcile::RemovalPolicy;
    use std::time::Duration;

    #[tokio::test]
    async fn token_round_trips_session_identity() {
        let store = SessionStore::new(StubApi::new(), RemovalPolicy::Confirmed, Duration::from_secs(60));
        let session = store
            .open(UserProfile {
                id: "u1".into(),
                name: "Meera".into(),
                email: "m@x.io".into(),
                is_admin: true,
            })
            .await;

        let token = generate_access_token(&session, "secret", 900).unwrap();
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.sid, session.id);
        assert!(claims.is_admin);
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
