use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::attendance::lenient_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// One day of a student's attendance history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceEntry {
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub verified_by: Option<VerifierRef>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub verification_method: Option<String>,
}

impl StudentAttendanceEntry {
    pub fn verifier_name(&self) -> &str {
        self.verified_by
            .as_ref()
            .and_then(|v| v.name.as_deref())
            .unwrap_or("N/A")
    }
}

/// Optional inclusive bounds for a history query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}
