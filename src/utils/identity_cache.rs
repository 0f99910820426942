use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::remote::AttendanceApi;

/// user id => display name, scoped to one operator session.
///
/// Unbounded and without expiry; cleared when the session ends. Concurrent
/// misses for the same id share one lookup, and failed lookups are never stored.
pub struct IdentityResolver {
    names: Cache<String, String>,
    api: Arc<dyn AttendanceApi>,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn AttendanceApi>) -> Self {
        Self {
            names: Cache::builder().build(),
            api,
        }
    }

    /// Resolve a user id to a display name, hitting the service at most once
    /// per id while the lookup is in flight.
    pub async fn resolve(&self, id: &str) -> Result<String, ResolveError> {
        let api = self.api.clone();
        let lookup_id = id.to_string();

        self.names
            .try_get_with(id.to_string(), async move {
                debug!(user_id = %lookup_id, "Resolving user name");
                api.resolve_user_name(&lookup_id).await
            })
            .await
            .map_err(|source| {
                warn!(user_id = %id, error = %source, "User name lookup failed");
                ResolveError {
                    id: id.to_string(),
                    source,
                }
            })
    }

    /// Seed a known name, e.g. the logged-in operator's own.
    pub async fn prime(&self, id: &str, name: &str) {
        self.names.insert(id.to_string(), name.to_string()).await;
    }

    pub fn contains(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    pub fn clear(&self) {
        self.names.invalidate_all();
    }
}
