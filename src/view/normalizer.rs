use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::warn;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, RawAttendanceRecord, Verifier};
use crate::utils::identity_cache::IdentityResolver;

/// Turn a raw batch into canonical records.
///
/// Verifier lookups for the whole batch run concurrently and are awaited
/// together; a failed lookup keeps the raw id instead of failing the batch.
/// Output order and length always match the input.
pub async fn normalize(
    raw: Vec<RawAttendanceRecord>,
    resolver: &IdentityResolver,
) -> Vec<AttendanceRecord> {
    join_all(raw.into_iter().map(|record| normalize_one(record, resolver))).await
}

async fn normalize_one(raw: RawAttendanceRecord, resolver: &IdentityResolver) -> AttendanceRecord {
    let verified_by = match raw.verified_by.as_deref().map(str::trim) {
        None | Some("") => Verifier::Pending,
        Some(id) => match resolver.resolve(id).await {
            Ok(name) => Verifier::Resolved(name),
            Err(_) => Verifier::Unresolved(id.to_string()),
        },
    };

    let time_in = raw.time_in.as_deref().and_then(|value| parse_time_in(&raw.id, value));

    AttendanceRecord {
        id: raw.id,
        student_id: raw.student_id,
        name: raw.name.unwrap_or_default(),
        register_no: raw.register_no,
        department: raw.department,
        year: raw.year,
        status: AttendanceStatus::from(raw.status.unwrap_or_default()),
        time_in,
        verification_method: raw.verification_method,
        verified_by,
        sync_error: None,
    }
}

fn parse_time_in(record_id: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!(record_id, value, error = %e, "Unparseable timeIn, treating as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::stub::{StubApi, raw};

    #[tokio::test]
    async fn preserves_order_and_length() {
        let api = StubApi::new();
        let resolver = IdentityResolver::new(api.clone());
        let batch: Vec<_> = (1..=6)
            .map(|i| raw(&format!("r{i}"), "CSE", "2", "Present", Some("2025-03-03T08:10:00Z")))
            .collect();

        let records = normalize(batch, &resolver).await;

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2", "r3", "r4", "r5", "r6"]);
        assert_eq!(api.lookups(), 0);
    }

    #[tokio::test]
    async fn resolves_verifier_and_forces_absent_without_time_in() {
        let api = StubApi::new();
        api.with_name("u42", "Dr. Rao");
        let resolver = IdentityResolver::new(api.clone());

        let mut record = raw("a1", "ECE", "3", "Present", None);
        record.verified_by = Some("u42".to_string());

        let normalized = normalize(vec![record], &resolver).await.remove(0);

        assert_eq!(normalized.verified_by, Verifier::Resolved("Dr. Rao".into()));
        assert_eq!(normalized.status, AttendanceStatus::Present);
        assert_eq!(normalized.effective_status(), AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn failed_lookup_keeps_raw_id_and_rest_of_batch() {
        let api = StubApi::new();
        api.with_name("u1", "Known");
        let resolver = IdentityResolver::new(api.clone());

        let mut first = raw("a1", "ECE", "3", "Present", None);
        first.verified_by = Some("u42".to_string());
        let mut second = raw("a2", "ECE", "3", "Present", Some("2025-03-03T08:10:00Z"));
        second.verified_by = Some("u1".to_string());

        let records = normalize(vec![first, second], &resolver).await;

        assert_eq!(records[0].verified_by, Verifier::Unresolved("u42".into()));
        assert_eq!(records[1].verified_by, Verifier::Resolved("Known".into()));
    }

    #[tokio::test]
    async fn same_verifier_across_batch_is_looked_up_once() {
        let api = StubApi::new();
        api.with_name("u7", "Anita");
        let resolver = IdentityResolver::new(api.clone());

        let batch: Vec<_> = (0..4)
            .map(|i| {
                let mut r = raw(&format!("r{i}"), "ME", "1", "Present", None);
                r.verified_by = Some("u7".to_string());
                r
            })
            .collect();

        let records = normalize(batch, &resolver).await;

        assert!(records.iter().all(|r| r.verified_by == Verifier::Resolved("Anita".into())));
        assert_eq!(api.lookups(), 1);
    }

    #[tokio::test]
    async fn garbage_time_in_is_treated_as_absent() {
        let api = StubApi::new();
        let resolver = IdentityResolver::new(api);

        let record = normalize(vec![raw("a1", "ME", "1", "Present", Some("yesterday"))], &resolver)
            .await
            .remove(0);

        assert!(record.time_in.is_none());
        assert_eq!(record.effective_status(), AttendanceStatus::Absent);
    }
}
