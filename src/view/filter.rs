use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;

pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Facet {
    Department,
    Year,
    Status,
}

/// Distinct values present in a collection, per facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSet {
    pub departments: BTreeSet<String>,
    pub years: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
}

/// Active filter; `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub department: Option<String>,
    pub year: Option<String>,
    pub status: Option<String>,
}

impl FilterSelection {
    /// Set one facet. "All" (or an empty value) clears it.
    pub fn set(&mut self, facet: Facet, value: &str) {
        let value = value.trim();
        let value = if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
            None
        } else {
            Some(value.to_string())
        };

        match facet {
            Facet::Department => self.department = value,
            Facet::Year => self.year = value,
            Facet::Status => self.status = value,
        }
    }

    pub fn get(&self, facet: Facet) -> &str {
        let value = match facet {
            Facet::Department => &self.department,
            Facet::Year => &self.year,
            Facet::Status => &self.status,
        };
        value.as_deref().unwrap_or(ALL)
    }

    pub fn is_all(&self) -> bool {
        self.department.is_none() && self.year.is_none() && self.status.is_none()
    }

    fn admits(&self, record: &AttendanceRecord) -> bool {
        fn matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
            wanted.as_deref().is_none_or(|w| actual == Some(w))
        }

        matches(&self.department, record.department.as_deref())
            && matches(&self.year, record.year.as_deref())
            && matches(&self.status, Some(record.effective_status().to_string().as_str()))
    }
}

impl Serialize for FilterSelection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FilterSelection", 3)?;
        state.serialize_field("department", self.get(Facet::Department))?;
        state.serialize_field("year", self.get(Facet::Year))?;
        state.serialize_field("status", self.get(Facet::Status))?;
        state.end()
    }
}

pub fn facets(records: &[AttendanceRecord]) -> FacetSet {
    let mut set = FacetSet::default();
    for record in records {
        if let Some(department) = record.department.as_deref().filter(|d| !d.is_empty()) {
            set.departments.insert(department.to_string());
        }
        if let Some(year) = record.year.as_deref().filter(|y| !y.is_empty()) {
            set.years.insert(year.to_string());
        }
        set.statuses.insert(record.effective_status().to_string());
    }
    set
}

/// Records passing `selection`, in input order.
pub fn apply(records: &[AttendanceRecord], selection: &FilterSelection) -> Vec<AttendanceRecord> {
    if selection.is_all() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| selection.admits(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceStatus, Verifier};
    use chrono::{TimeZone, Utc};

    fn record(id: &str, department: &str, year: &str, status: &str, checked_in: bool) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            student_id: None,
            name: format!("Student {id}"),
            register_no: None,
            department: Some(department.to_string()).filter(|d| !d.is_empty()),
            year: Some(year.to_string()).filter(|y| !y.is_empty()),
            status: AttendanceStatus::from(status.to_string()),
            time_in: checked_in.then(|| Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap()),
            verification_method: None,
            verified_by: Verifier::Pending,
            sync_error: None,
        }
    }

    fn sample() -> Vec<AttendanceRecord> {
        vec![
            record("1", "CSE", "1", "Present", true),
            record("2", "ECE", "2", "Present", false),
            record("3", "CSE", "2", "Absent", false),
            record("4", "", "", "Late", true),
            record("5", "CSE", "1", "Present", true),
        ]
    }

    #[test]
    fn facets_skip_empty_values_and_use_effective_status() {
        let set = facets(&sample());

        assert_eq!(set.departments.iter().collect::<Vec<_>>(), ["CSE", "ECE"]);
        assert_eq!(set.years.iter().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(set.statuses.iter().collect::<Vec<_>>(), ["Absent", "Late", "Present"]);
    }

    #[test]
    fn no_time_in_counts_as_absent_even_when_reported_present() {
        let records = vec![record("2", "ECE", "2", "Present", false)];
        let set = facets(&records);
        assert!(set.statuses.contains("Absent"));
        assert!(!set.statuses.contains("Present"));

        let mut selection = FilterSelection::default();
        selection.set(Facet::Status, "Present");
        assert!(apply(&records, &selection).is_empty());
    }

    #[test]
    fn all_selection_is_identity() {
        let records = sample();
        assert_eq!(apply(&records, &FilterSelection::default()), records);
    }

    #[test]
    fn apply_is_an_ordered_subsequence() {
        let records = sample();
        let mut selection = FilterSelection::default();
        selection.set(Facet::Department, "CSE");
        selection.set(Facet::Status, "Present");

        let ids: Vec<_> = apply(&records, &selection).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["1", "5"]);

        for facet_value in ["1", "2", "9"] {
            selection.set(Facet::Year, facet_value);
            let filtered = apply(&records, &selection);
            let mut cursor = records.iter();
            for kept in &filtered {
                assert!(cursor.any(|r| r == kept), "filtered output must follow input order");
            }
        }
    }

    #[test]
    fn setting_all_clears_a_facet() {
        let mut selection = FilterSelection::default();
        selection.set(Facet::Year, "2");
        assert_eq!(selection.get(Facet::Year), "2");

        selection.set(Facet::Year, "All");
        assert!(selection.is_all());
        assert_eq!(
            serde_json::to_value(&selection).unwrap(),
            serde_json::json!({ "department": "All", "year": "All", "status": "All" })
        );
    }
}
