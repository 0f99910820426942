use serde::Serialize;

use crate::error::RemoteError;
use crate::model::student::{DateRange, StudentAttendanceEntry};
use crate::remote::AttendanceApi;

pub const DEFAULT_PER_PAGE: usize = 5;
const UNKNOWN_STUDENT: &str = "Unknown Student";

/// One page of a student's attendance history.
#[derive(Debug, Serialize)]
pub struct StudentHistory {
    pub student_name: String,
    pub entries: Vec<HistoryRow>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HistoryRow {
    pub date: String,
    pub status: String,
    pub verified_by: String,
    pub verification_method: String,
}

impl From<&StudentAttendanceEntry> for HistoryRow {
    fn from(entry: &StudentAttendanceEntry) -> Self {
        Self {
            date: entry.date.clone(),
            status: entry.status.clone().unwrap_or_default(),
            verified_by: entry.verifier_name().to_string(),
            verification_method: entry
                .verification_method
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// Cut `entries` into pages; `page` is 1-based and clamped to at least 1.
pub fn paginate(entries: &[StudentAttendanceEntry], page: usize, per_page: usize) -> StudentHistory {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = entries.len();
    // past the end of any real history
    let offset = (page - 1).checked_mul(per_page).unwrap_or(usize::MAX);

    StudentHistory {
        student_name: entries
            .first()
            .and_then(|e| e.name.clone())
            .unwrap_or_else(|| UNKNOWN_STUDENT.to_string()),
        entries: entries
            .iter()
            .skip(offset)
            .take(per_page)
            .map(HistoryRow::from)
            .collect(),
        page,
        per_page,
        total,
        total_pages: total.div_ceil(per_page),
    }
}

pub async fn load(
    api: &dyn AttendanceApi,
    student_id: &str,
    range: DateRange,
    page: usize,
    per_page: usize,
) -> Result<StudentHistory, RemoteError> {
    let entries = api.fetch_student_attendance(student_id, range).await?;
    Ok(paginate(&entries, page, per_page))
}
