//! In-memory attendance service used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use tokio::sync::Notify;

use super::{AttendanceApi, ReportMail};
use crate::error::RemoteError;
use crate::model::attendance::RawAttendanceRecord;
use crate::model::student::{DateRange, StudentAttendanceEntry};
use crate::model::user::UserProfile;

fn unavailable() -> RemoteError {
    RemoteError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: "stubbed failure".to_string(),
    }
}

#[derive(Default)]
pub struct StubApi {
    pub daily: Mutex<HashMap<NaiveDate, Vec<RawAttendanceRecord>>>,
    pub unverified: Mutex<HashMap<NaiveDate, Vec<RawAttendanceRecord>>>,
    pub failing_dates: Mutex<HashSet<NaiveDate>>,
    /// Fetches for these dates wait until the gate is notified.
    pub fetch_gates: Mutex<HashMap<NaiveDate, Arc<Notify>>>,
    pub names: Mutex<HashMap<String, String>>,
    pub failing_records: Mutex<HashSet<String>>,
    /// Approve/decline calls for these records wait until the gate is notified.
    pub mutation_gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub approved: Mutex<Vec<(String, String)>>,
    pub declined: Mutex<Vec<(String, String)>>,
    pub history: Mutex<Vec<StudentAttendanceEntry>>,
    pub users: Mutex<HashMap<String, (String, UserProfile)>>,
    pub sent_reports: Mutex<Vec<ReportMail>>,
    pub generate_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
}

impl StubApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_daily(&self, date: NaiveDate, records: Vec<RawAttendanceRecord>) {
        self.daily.lock().unwrap().insert(date, records);
    }

    pub fn with_unverified(&self, date: NaiveDate, records: Vec<RawAttendanceRecord>) {
        self.unverified.lock().unwrap().insert(date, records);
    }

    pub fn with_name(&self, id: &str, name: &str) {
        self.names.lock().unwrap().insert(id.to_string(), name.to_string());
    }

    pub fn with_user(&self, email: &str, password: &str, profile: UserProfile) {
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), profile));
    }

    pub fn fail_date(&self, date: NaiveDate) {
        self.failing_dates.lock().unwrap().insert(date);
    }

    pub fn fail_record(&self, id: &str) {
        self.failing_records.lock().unwrap().insert(id.to_string());
    }

    pub fn gate_date(&self, date: NaiveDate) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.fetch_gates.lock().unwrap().insert(date, gate.clone());
        gate
    }

    pub fn gate_record(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.mutation_gates.lock().unwrap().insert(id.to_string(), gate.clone());
        gate
    }

    pub fn lookups(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    async fn fetch_from(
        &self,
        source: &Mutex<HashMap<NaiveDate, Vec<RawAttendanceRecord>>>,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError> {
        let gate = self.fetch_gates.lock().unwrap().get(&date).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing_dates.lock().unwrap().contains(&date) {
            return Err(unavailable());
        }
        Ok(source.lock().unwrap().get(&date).cloned().unwrap_or_default())
    }

    async fn pass_mutation_gate(&self, id: &str) {
        let gate = self.mutation_gates.lock().unwrap().get(id).cloned();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
    }

    fn mutate(&self, log: &Mutex<Vec<(String, String)>>, id: &str, verifier: &str) -> Result<(), RemoteError> {
        if self.failing_records.lock().unwrap().contains(id) {
            return Err(unavailable());
        }
        log.lock().unwrap().push((id.to_string(), verifier.to_string()));
        Ok(())
    }
}

#[async_trait]
impl AttendanceApi for StubApi {
    async fn generate_attendance_for_date(&self, _date: NaiveDate) -> Result<(), RemoteError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_attendance_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError> {
        self.fetch_from(&self.daily, date).await
    }

    async fn fetch_unverified_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError> {
        self.fetch_from(&self.unverified, date).await
    }

    async fn resolve_user_name(&self, user_id: &str) -> Result<String, RemoteError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        // let concurrent callers pile up on the same miss
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.names
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(unavailable)
    }

    async fn submit_approval(&self, record_id: &str, verifier_id: &str) -> Result<(), RemoteError> {
        self.pass_mutation_gate(record_id).await;
        self.mutate(&self.approved, record_id, verifier_id)
    }

    async fn submit_decline(&self, record_id: &str, verifier_id: &str) -> Result<(), RemoteError> {
        self.pass_mutation_gate(record_id).await;
        self.mutate(&self.declined, record_id, verifier_id)
    }

    async fn fetch_student_attendance(
        &self,
        _student_id: &str,
        _range: DateRange,
    ) -> Result<Vec<StudentAttendanceEntry>, RemoteError> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, RemoteError> {
        match self.users.lock().unwrap().get(email) {
            Some((expected, profile)) if expected == password => Ok(profile.clone()),
            _ => Err(RemoteError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials".to_string(),
            }),
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, RemoteError> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|(_, profile)| profile.id == user_id)
            .map(|(_, profile)| profile.clone())
            .ok_or_else(unavailable)
    }

    async fn send_report(&self, mail: ReportMail) -> Result<(), RemoteError> {
        self.sent_reports.lock().unwrap().push(mail);
        Ok(())
    }
}

pub fn raw(id: &str, department: &str, year: &str, status: &str, time_in: Option<&str>) -> RawAttendanceRecord {
    RawAttendanceRecord {
        id: id.to_string(),
        student_id: Some(format!("s-{id}")),
        name: Some(format!("Student {id}")),
        register_no: Some(format!("REG-{id}")),
        department: Some(department.to_string()).filter(|d| !d.is_empty()),
        year: Some(year.to_string()).filter(|y| !y.is_empty()),
        status: Some(status.to_string()),
        time_in: time_in.map(str::to_string),
        verification_method: Some("face".to_string()),
        verified_by: None,
    }
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}
