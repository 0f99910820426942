use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::EnumString;

/// Attendance row as the attendance service returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttendanceRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub register_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time_in: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub verification_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub verified_by: Option<String>,
}

/// Server-reported presence. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[strum(default)]
    Other(String),
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Present => f.write_str("Present"),
            AttendanceStatus::Absent => f.write_str("Absent"),
            AttendanceStatus::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for AttendanceStatus {
    fn from(value: String) -> Self {
        AttendanceStatus::from_str(&value).unwrap_or(AttendanceStatus::Other(value))
    }
}

impl Serialize for AttendanceStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Who verified a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "name", rename_all = "snake_case")]
pub enum Verifier {
    Pending,
    Resolved(String),
    /// Lookup failed; the raw user id is kept for display.
    Unresolved(String),
}

impl Verifier {
    pub fn display_name(&self) -> &str {
        match self {
            Verifier::Pending => "Pending",
            Verifier::Resolved(name) | Verifier::Unresolved(name) => name,
        }
    }
}

/// Canonical record after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: Option<String>,
    pub name: String,
    pub register_no: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    /// Stored value, kept for audit display.
    pub status: AttendanceStatus,
    pub time_in: Option<DateTime<Utc>>,
    pub verification_method: Option<String>,
    pub verified_by: Verifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

impl AttendanceRecord {
    /// Status used for facets and filtering: no check-in means absent.
    pub fn effective_status(&self) -> AttendanceStatus {
        match self.time_in {
            None => AttendanceStatus::Absent,
            Some(_) => self.status.clone(),
        }
    }
}

/// Accepts a string or a number, maps null and "" to `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_accepts_numeric_year_and_null_fields() {
        let raw: RawAttendanceRecord = serde_json::from_value(json!({
            "_id": "a1",
            "studentId": "s1",
            "name": "Asha",
            "registerNo": 1042,
            "department": "CSE",
            "year": 3,
            "status": "Present",
            "timeIn": null,
            "verifiedBy": ""
        }))
        .unwrap();

        assert_eq!(raw.id, "a1");
        assert_eq!(raw.year.as_deref(), Some("3"));
        assert_eq!(raw.register_no.as_deref(), Some("1042"));
        assert!(raw.time_in.is_none());
        assert!(raw.verified_by.is_none());
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        assert_eq!(AttendanceStatus::from("Present".to_string()), AttendanceStatus::Present);
        assert_eq!(
            AttendanceStatus::from("Late".to_string()),
            AttendanceStatus::Other("Late".to_string())
        );
        assert_eq!(AttendanceStatus::Other("Late".into()).to_string(), "Late");
    }
}
