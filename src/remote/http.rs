use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

use super::{AttendanceApi, ReportMail};
use crate::error::RemoteError;
use crate::model::attendance::RawAttendanceRecord;
use crate::model::student::{DateRange, StudentAttendanceEntry};
use crate::model::user::UserProfile;

/// `{ success, data, message }` wrapper used by the attendance service.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, RemoteError> {
        if self.success == Some(false) {
            return Err(RemoteError::Rejected(
                self.message.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        self.data.ok_or_else(|| {
            RemoteError::Rejected(self.message.unwrap_or_else(|| "response had no data".to_string()))
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StudentHistoryBody {
    #[serde(default)]
    attendance: Vec<StudentAttendanceEntry>,
}

/// reqwest-backed client for the attendance service REST API.
#[derive(Clone)]
pub struct HttpAttendanceApi {
    base_url: String,
    client: Client,
}

impl HttpAttendanceApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<reqwest::Response, RemoteError> {
        let response = request.send().await.map_err(|e| {
            error!(error = %e, context, "Attendance service unreachable");
            RemoteError::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, context, "Attendance service returned an error");
            return Err(RemoteError::Status { status, message });
        }

        debug!(%status, context, "Attendance service call succeeded");
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, RemoteError> {
        let response = self.send(request, context).await?;
        Ok(response.json::<T>().await?)
    }

    async fn records(&self, path: String, context: &str) -> Result<Vec<RawAttendanceRecord>, RemoteError> {
        let envelope: Envelope<Vec<RawAttendanceRecord>> =
            self.send_json(self.client.get(self.url(&path)), context).await?;
        // an envelope without data is an empty day, not a failure
        if envelope.success == Some(false) {
            return envelope.into_data();
        }
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl AttendanceApi for HttpAttendanceApi {
    async fn generate_attendance_for_date(&self, date: NaiveDate) -> Result<(), RemoteError> {
        let request = self.client.post(self.url(&format!("/attendance/generate/{date}")));
        self.send(request, "generate attendance").await.map(|_| ())
    }

    async fn fetch_attendance_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError> {
        self.records(format!("/attendance/date/{date}"), "attendance by date")
            .await
    }

    async fn fetch_unverified_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>, RemoteError> {
        self.records(format!("/attendance/unverified/{date}"), "unverified attendance")
            .await
    }

    async fn resolve_user_name(&self, user_id: &str) -> Result<String, RemoteError> {
        let envelope: Envelope<UserName> = self
            .send_json(self.client.get(self.url(&format!("/users/{user_id}"))), "user by id")
            .await?;
        Ok(envelope.into_data()?.name)
    }

    async fn submit_approval(&self, record_id: &str, verifier_id: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/attendance/approve/{record_id}")))
            .json(&json!({ "verifiedBy": verifier_id }));
        self.send(request, "approve attendance").await.map(|_| ())
    }

    async fn submit_decline(&self, record_id: &str, verifier_id: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/attendance/decline/{record_id}")))
            .json(&json!({ "verifiedBy": verifier_id }));
        self.send(request, "decline attendance").await.map(|_| ())
    }

    async fn fetch_student_attendance(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<StudentAttendanceEntry>, RemoteError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(start) = range.start {
            params.push(("startDate", start.to_string()));
        }
        if let Some(end) = range.end {
            params.push(("endDate", end.to_string()));
        }

        let request = self
            .client
            .get(self.url(&format!("/attendance/student/{student_id}")))
            .query(&params);
        let body: StudentHistoryBody = self.send_json(request, "student attendance").await?;
        Ok(body.attendance)
    }

    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, RemoteError> {
        let request = self
            .client
            .post(self.url("/users/login"))
            .json(&json!({ "email": email, "password": password }));
        let envelope: Envelope<UserProfile> = self.send_json(request, "login").await?;
        envelope.into_data()
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, RemoteError> {
        let request = self
            .client
            .get(self.url("/users/profile"))
            .query(&[("id", user_id)]);
        let envelope: Envelope<UserProfile> = self.send_json(request, "profile").await?;
        envelope.into_data()
    }

    async fn send_report(&self, mail: ReportMail) -> Result<(), RemoteError> {
        let attachment = Part::bytes(mail.body)
            .file_name(mail.file_name)
            .mime_str(mail.content_type)?;
        let form = Form::new()
            .text("emails", mail.recipients.join(","))
            .text("message", mail.message)
            .part(mail.field_name, attachment);

        let request = self.client.post(self.url("/api/send-email")).multipart(form);
        self.send(request, "send report").await.map(|_| ())
    }
}
