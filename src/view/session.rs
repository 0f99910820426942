use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::info;
use uuid::Uuid;

use super::controller::{ViewController, ViewKind};
use super::reconcile::RemovalPolicy;
use crate::model::role::Role;
use crate::model::user::{ActingUser, UserProfile};
use crate::remote::AttendanceApi;
use crate::utils::identity_cache::IdentityResolver;

/// One logged-in operator: identity, name cache and both views.
pub struct Session {
    pub id: String,
    pub profile: UserProfile,
    pub resolver: Arc<IdentityResolver>,
    pub daily: ViewController,
    pub pending: ViewController,
}

impl Session {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn acting_user(&self) -> ActingUser {
        ActingUser {
            id: self.profile.id.clone(),
            name: self.profile.name.clone(),
        }
    }

    pub fn view(&self, kind: ViewKind) -> &ViewController {
        match kind {
            ViewKind::Daily => &self.daily,
            ViewKind::Pending => &self.pending,
        }
    }

    fn close(&self) {
        self.daily.reset();
        self.pending.reset();
        self.resolver.clear();
    }
}

/// Live sessions keyed by session id, expiring after a period of inactivity.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<Session>>,
    api: Arc<dyn AttendanceApi>,
    policy: RemovalPolicy,
}

impl SessionStore {
    pub fn new(api: Arc<dyn AttendanceApi>, policy: RemovalPolicy, idle_ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .time_to_idle(idle_ttl)
                .eviction_listener(|sid: Arc<String>, session: Arc<Session>, cause| {
                    info!(session_id = %sid, ?cause, "Session closed");
                    session.close();
                })
                .build(),
            api,
            policy,
        }
    }

    pub async fn open(&self, profile: UserProfile) -> Arc<Session> {
        let resolver = Arc::new(IdentityResolver::new(self.api.clone()));
        resolver.prime(&profile.id, &profile.name).await;

        let session = Arc::new(Session {
            id: Uuid::new_v4().to_string(),
            daily: ViewController::new(ViewKind::Daily, self.api.clone(), resolver.clone(), self.policy),
            pending: ViewController::new(ViewKind::Pending, self.api.clone(), resolver.clone(), self.policy),
            resolver,
            profile,
        });

        self.sessions.insert(session.id.clone(), session.clone()).await;
        info!(session_id = %session.id, user_id = %session.profile.id, "Session opened");
        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).await
    }

    /// Idempotent.
    pub async fn close(&self, session_id: &str) {
        if let Some(session) = self.sessions.remove(session_id).await {
            session.close();
        }
    }
}
