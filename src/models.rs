use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::view::filter::Facet;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@college.edu")]
    pub email: String,
    #[schema(example = "secret")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub name: String,
    #[schema(example = "admin")]
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// remote user id
    pub sub: String,
    pub name: String,
    pub is_admin: bool,
    /// session id
    pub sid: String,
    pub exp: usize,
    pub jti: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectDateReq {
    #[schema(example = "2025-03-03", format = "date", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct FilterReq {
    pub facet: Facet,
    /// facet value, or "All" to clear
    #[schema(example = "CSE")]
    pub value: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SendReportReq {
    /// comma separated recipients
    #[schema(example = "hod@college.edu, office@college.edu")]
    pub emails: String,
    #[serde(default)]
    #[schema(example = "Attendance for today")]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Csv,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// pdf (default) or csv
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StudentHistoryQuery {
    #[schema(example = "2025-03-01", format = "date", value_type = Option<String>)]
    /// Inclusive start date
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2025-03-31", format = "date", value_type = Option<String>)]
    /// Inclusive end date
    pub end_date: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<usize>,
    #[schema(example = 5)]
    /// Pagination per page number
    pub per_page: Option<usize>,
}
