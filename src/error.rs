use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the remote attendance service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("attendance service returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("attendance service rejected the request: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// True when the service answered 401/403.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RemoteError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

#[derive(Debug, Error)]
#[error("failed to fetch attendance for {date}: {source}")]
pub struct FetchError {
    pub date: NaiveDate,
    #[source]
    pub source: RemoteError,
}

/// Lookup failure shared by every caller that awaited the same miss.
#[derive(Debug, Clone, Error)]
#[error("could not resolve user {id}: {source}")]
pub struct ResolveError {
    pub id: String,
    #[source]
    pub source: Arc<RemoteError>,
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("record {0} is not in the current view")]
    UnknownRecord(String),

    #[error("record {0} already has a decision in flight")]
    InFlight(String),

    #[error("record {id} could not be updated: {source}")]
    Remote {
        id: String,
        #[source]
        source: RemoteError,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no recipients given")]
    NoRecipients,

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("report buffer could not be flushed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
