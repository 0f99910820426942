use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use super::filter::{self, Facet, FacetSet, FilterSelection};
use super::normalizer::normalize;
use super::reconcile::{
    Decision, Detached, MutationFailure, ReconcileOutcome, ReconciliationQueue, RemovalPolicy, settle,
};
use crate::error::{FetchError, MutationError};
use crate::model::attendance::{AttendanceRecord, RawAttendanceRecord};
use crate::model::user::ActingUser;
use crate::remote::AttendanceApi;
use crate::utils::identity_cache::IdentityResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ViewKind {
    /// Every record of the day.
    Daily,
    /// Records still awaiting verification.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum ViewStatus {
    Idle,
    Fetching,
    Ready,
    Failed,
}

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub view: ViewKind,
    pub status: ViewStatus,
    pub date: Option<NaiveDate>,
    pub records: Vec<AttendanceRecord>,
    pub facets: FacetSet,
    pub filtered_records: Vec<AttendanceRecord>,
    pub selection: FilterSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct ViewState {
    /// Bumped on every date selection; stale completions compare against it.
    ticket: u64,
    date: Option<NaiveDate>,
    status: ViewStatus,
    records: Vec<AttendanceRecord>,
    facets: FacetSet,
    filtered: Vec<AttendanceRecord>,
    selection: FilterSelection,
    error: Option<String>,
    /// Record ids with an approve/decline call outstanding.
    in_flight: HashSet<String>,
}

impl ViewState {
    fn new() -> Self {
        Self {
            ticket: 0,
            date: None,
            status: ViewStatus::Idle,
            records: Vec::new(),
            facets: FacetSet::default(),
            filtered: Vec::new(),
            selection: FilterSelection::default(),
            error: None,
            in_flight: HashSet::new(),
        }
    }

    fn replace_records(&mut self, records: Vec<AttendanceRecord>) {
        self.records = records;
        self.facets = filter::facets(&self.records);
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = filter::apply(&self.records, &self.selection);
    }

    fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    fn snapshot(&self, view: ViewKind) -> ViewSnapshot {
        ViewSnapshot {
            view,
            status: self.status,
            date: self.date,
            records: self.records.clone(),
            facets: self.facets.clone(),
            filtered_records: self.filtered.clone(),
            selection: self.selection.clone(),
            error: self.error.clone(),
        }
    }
}

/// Fetch → normalize → facets → snapshot, per selected date.
///
/// State lives behind a mutex that is never held across a network call, so a
/// newer date selection can start while an older fetch is still in flight.
/// Whatever completes for an outdated ticket is dropped.
pub struct ViewController {
    kind: ViewKind,
    api: Arc<dyn AttendanceApi>,
    resolver: Arc<IdentityResolver>,
    queue: ReconciliationQueue,
    state: Mutex<ViewState>,
}

impl ViewController {
    pub fn new(
        kind: ViewKind,
        api: Arc<dyn AttendanceApi>,
        resolver: Arc<IdentityResolver>,
        policy: RemovalPolicy,
    ) -> Self {
        Self {
            kind,
            queue: ReconciliationQueue::new(api.clone(), policy),
            api,
            resolver,
            state: Mutex::new(ViewState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state().snapshot(self.kind)
    }

    #[instrument(name = "select_date", skip(self), fields(view = %self.kind))]
    pub async fn select_date(&self, date: NaiveDate) -> ViewSnapshot {
        let ticket = {
            let mut state = self.state();
            state.ticket += 1;
            state.date = Some(date);
            state.status = ViewStatus::Fetching;
            state.error = None;
            state.replace_records(Vec::new());
            debug!(ticket = state.ticket, "Fetching");
            state.ticket
        };

        let fetched = self.fetch(date).await;
        let fetched = match fetched {
            Ok(raw) => Ok(normalize(raw, &self.resolver).await),
            Err(e) => Err(e),
        };

        let mut state = self.state();
        if state.ticket != ticket {
            debug!(ticket, current = state.ticket, "Discarding superseded fetch");
            return state.snapshot(self.kind);
        }

        match fetched {
            Ok(records) => {
                info!(records = records.len(), "Attendance view ready");
                state.status = ViewStatus::Ready;
                state.replace_records(records);
            }
            Err(e) => {
                warn!(error = %e, "Attendance view failed");
                state.status = ViewStatus::Failed;
                state.error = Some(e.to_string());
                state.replace_records(Vec::new());
            }
        }
        state.snapshot(self.kind)
    }

    async fn fetch(&self, date: NaiveDate) -> Result<Vec<RawAttendanceRecord>, FetchError> {
        let result = match self.kind {
            ViewKind::Daily => {
                if let Err(e) = self.api.generate_attendance_for_date(date).await {
                    warn!(%date, error = %e, "Generating attendance failed, fetching anyway");
                }
                self.api.fetch_attendance_by_date(date).await
            }
            ViewKind::Pending => self.api.fetch_unverified_by_date(date).await,
        };
        result.map_err(|source| FetchError { date, source })
    }

    /// Change one facet and recompute the filtered view; never refetches.
    pub fn set_filter(&self, facet: Facet, value: &str) -> ViewSnapshot {
        let mut state = self.state();
        state.selection.set(facet, value);
        state.refilter();
        debug!(view = %self.kind, %facet, value, "Filter changed");
        state.snapshot(self.kind)
    }

    pub async fn approve(&self, id: &str, actor: &ActingUser) -> Result<ViewSnapshot, MutationError> {
        self.decide_one(Decision::Approve, id, actor).await
    }

    pub async fn decline(&self, id: &str, actor: &ActingUser) -> Result<ViewSnapshot, MutationError> {
        self.decide_one(Decision::Decline, id, actor).await
    }

    /// Approve every record of the current filtered view.
    pub async fn approve_all(&self, actor: &ActingUser) -> (ReconcileOutcome, ViewSnapshot) {
        self.decide_visible(Decision::Approve, actor).await
    }

    /// Decline every record of the current filtered view.
    pub async fn decline_all(&self, actor: &ActingUser) -> (ReconcileOutcome, ViewSnapshot) {
        self.decide_visible(Decision::Decline, actor).await
    }

    async fn decide_one(
        &self,
        decision: Decision,
        id: &str,
        actor: &ActingUser,
    ) -> Result<ViewSnapshot, MutationError> {
        let ids = vec![id.to_string()];
        let (ticket, detached) = {
            let mut state = self.state();
            if state.in_flight.contains(id) {
                return Err(MutationError::InFlight(id.to_string()));
            }
            if !state.contains(id) {
                return Err(MutationError::UnknownRecord(id.to_string()));
            }
            self.begin(&mut state, &ids)
        };
        let result = self.queue.submit(decision, id, actor).await;

        let outcome = match &result {
            Ok(()) => ReconcileOutcome {
                decision: Some(decision),
                succeeded: ids.clone(),
                failed: Vec::new(),
            },
            Err(e) => ReconcileOutcome {
                decision: Some(decision),
                succeeded: Vec::new(),
                failed: vec![MutationFailure {
                    id: id.to_string(),
                    reason: e.to_string(),
                }],
            },
        };
        let snapshot = self.finish(ticket, &ids, detached, &outcome);
        result.map(|()| snapshot)
    }

    /// Decide every visible record that has no call outstanding yet.
    async fn decide_visible(&self, decision: Decision, actor: &ActingUser) -> (ReconcileOutcome, ViewSnapshot) {
        let (ids, ticket, detached) = {
            let mut state = self.state();
            let ids: Vec<String> = state
                .filtered
                .iter()
                .filter(|r| !state.in_flight.contains(&r.id))
                .map(|r| r.id.clone())
                .collect();
            if ids.is_empty() {
                let outcome = ReconcileOutcome {
                    decision: Some(decision),
                    ..Default::default()
                };
                return (outcome, state.snapshot(self.kind));
            }
            let (ticket, detached) = self.begin(&mut state, &ids);
            (ids, ticket, detached)
        };

        let outcome = self.queue.submit_batch(decision, ids.clone(), actor).await;
        let snapshot = self.finish(ticket, &ids, detached, &outcome);
        (outcome, snapshot)
    }

    /// Mark `ids` in flight, clear stale error flags and, when optimistic,
    /// pull the targets out now.
    fn begin(&self, state: &mut ViewState, ids: &[String]) -> (u64, Option<Detached>) {
        state.in_flight.extend(ids.iter().cloned());
        for record in state.records.iter_mut().filter(|r| ids.contains(&r.id)) {
            record.sync_error = None;
        }

        let detached = match self.queue.policy() {
            RemovalPolicy::Confirmed => None,
            RemovalPolicy::Optimistic => Some(Detached::take(&mut state.records, ids)),
        };
        state.facets = filter::facets(&state.records);
        state.refilter();
        (state.ticket, detached)
    }

    fn finish(
        &self,
        ticket: u64,
        ids: &[String],
        detached: Option<Detached>,
        outcome: &ReconcileOutcome,
    ) -> ViewSnapshot {
        let mut state = self.state();
        for id in ids {
            state.in_flight.remove(id);
        }
        if state.ticket != ticket {
            debug!(ticket, current = state.ticket, "Date changed during reconciliation, leaving view as is");
            return state.snapshot(self.kind);
        }

        match detached {
            Some(detached) => detached.restore_failed(&mut state.records, outcome),
            None => settle(&mut state.records, outcome),
        }
        state.facets = filter::facets(&state.records);
        state.refilter();
        state.snapshot(self.kind)
    }

    /// Forget the collection, e.g. when the session ends.
    pub fn reset(&self) {
        let mut state = self.state();
        let ticket = state.ticket + 1;
        *state = ViewState {
            ticket,
            ..ViewState::new()
        };
    }
}
