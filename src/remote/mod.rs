use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::RemoteError;
use crate::model::attendance::RawAttendanceRecord;
use crate::model::student::{DateRange, StudentAttendanceEntry};
use crate::model::user::UserProfile;

pub mod http;
#[cfg(test)]
pub mod stub;

pub use http::HttpAttendanceApi;

/// A report file mailed through the attendance service.
#[derive(Debug, Clone)]
pub struct ReportMail {
    pub recipients: Vec<String>,
    pub message: String,
    /// multipart field the file travels in
    pub field_name: &'static str,
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Everything this desk needs from the attendance service.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Materializes the day's records upstream. Idempotent.
    async fn generate_attendance_for_date(&self, date: NaiveDate) -> Result<(), RemoteError>;

    async fn fetch_attendance_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError>;

    async fn fetch_unverified_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError>;

    async fn resolve_user_name(&self, user_id: &str) -> Result<String, RemoteError>;

    async fn submit_approval(&self, record_id: &str, verifier_id: &str)
    -> Result<(), RemoteError>;

    async fn submit_decline(&self, record_id: &str, verifier_id: &str) -> Result<(), RemoteError>;

    async fn fetch_student_attendance(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<StudentAttendanceEntry>, RemoteError>;

    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, RemoteError>;

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, RemoteError>;

    async fn send_report(&self, mail: ReportMail) -> Result<(), RemoteError>;
}
