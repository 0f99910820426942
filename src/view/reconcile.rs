use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{error, info};

use crate::error::{MutationError, RemoteError};
use crate::model::attendance::AttendanceRecord;
use crate::model::user::ActingUser;
use crate::remote::AttendanceApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Decline,
}

/// When a reconciled record leaves the local pending list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RemovalPolicy {
    /// After the service confirms.
    #[default]
    Confirmed,
    /// Before the call; failures are put back.
    Optimistic,
}

impl RemovalPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        RemovalPolicy::from_str(value.trim()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationFailure {
    pub id: String,
    pub reason: String,
}

/// Per-record result of a (bulk) decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub decision: Option<Decision>,
    pub succeeded: Vec<String>,
    pub failed: Vec<MutationFailure>,
}

impl ReconcileOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends approve/decline decisions to the attendance service.
#[derive(Clone)]
pub struct ReconciliationQueue {
    api: Arc<dyn AttendanceApi>,
    policy: RemovalPolicy,
}

impl ReconciliationQueue {
    pub fn new(api: Arc<dyn AttendanceApi>, policy: RemovalPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    /// One remote update, no retry.
    pub async fn submit(
        &self,
        decision: Decision,
        id: &str,
        actor: &ActingUser,
    ) -> Result<(), MutationError> {
        let result: Result<(), RemoteError> = match decision {
            Decision::Approve => self.api.submit_approval(id, &actor.id).await,
            Decision::Decline => self.api.submit_decline(id, &actor.id).await,
        };

        result.map_err(|source| {
            error!(record_id = id, %decision, actor = %actor.name, error = %source, "Reconciliation failed");
            MutationError::Remote {
                id: id.to_string(),
                source,
            }
        })
    }

    /// Issue every decision concurrently and wait for the whole batch.
    pub async fn submit_batch(
        &self,
        decision: Decision,
        ids: Vec<String>,
        actor: &ActingUser,
    ) -> ReconcileOutcome {
        let results = join_all(ids.iter().map(|id| self.submit(decision, id, actor))).await;

        let mut outcome = ReconcileOutcome {
            decision: Some(decision),
            ..Default::default()
        };
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => outcome.succeeded.push(id),
                Err(e) => outcome.failed.push(MutationFailure {
                    id,
                    reason: e.to_string(),
                }),
            }
        }

        info!(
            %decision,
            actor = %actor.name,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk reconciliation finished"
        );
        outcome
    }
}

/// Drop settled records and flag the failed ones, keeping order.
pub fn settle(records: &mut Vec<AttendanceRecord>, outcome: &ReconcileOutcome) {
    let failures: HashMap<&str, &str> = outcome
        .failed
        .iter()
        .map(|f| (f.id.as_str(), f.reason.as_str()))
        .collect();

    records.retain(|r| !outcome.succeeded.contains(&r.id));
    for record in records.iter_mut() {
        if let Some(reason) = failures.get(record.id.as_str()) {
            record.sync_error = Some((*reason).to_string());
        }
    }
}

/// Records taken out ahead of an optimistic call.
///
/// Each one remembers the id of the record that preceded it, so a failure can
/// go back next to its neighbour even if other batches reshuffled the list.
#[derive(Debug, Default)]
pub struct Detached {
    entries: Vec<(Option<String>, AttendanceRecord)>,
}

impl Detached {
    /// Remove `ids` from `records`, remembering each one's predecessor.
    pub fn take(records: &mut Vec<AttendanceRecord>, ids: &[String]) -> Self {
        let mut entries = Vec::new();
        let mut previous: Option<String> = None;
        let mut kept = Vec::with_capacity(records.len());
        for record in records.drain(..) {
            let id = record.id.clone();
            if ids.contains(&record.id) {
                entries.push((previous.clone(), record));
            } else {
                kept.push(record);
            }
            previous = Some(id);
        }
        *records = kept;
        Self { entries }
    }

    /// Put back the records the service refused, flagged with the reason.
    pub fn restore_failed(self, records: &mut Vec<AttendanceRecord>, outcome: &ReconcileOutcome) {
        // succeeded id => the anchor a record following it should use instead
        let mut forwarded: HashMap<String, Option<String>> = HashMap::new();

        for (anchor, mut record) in self.entries {
            let anchor = match anchor {
                Some(id) => forwarded.get(&id).cloned().unwrap_or(Some(id)),
                None => None,
            };

            match outcome.failed.iter().find(|f| f.id == record.id) {
                Some(failure) => {
                    record.sync_error = Some(failure.reason.clone());
                    let at = match &anchor {
                        None => 0,
                        Some(id) => records
                            .iter()
                            .position(|r| &r.id == id)
                            .map_or(records.len(), |i| i + 1),
                    };
                    records.insert(at, record);
                }
                None => {
                    forwarded.insert(record.id, anchor);
                }
            }
        }
    }
}
