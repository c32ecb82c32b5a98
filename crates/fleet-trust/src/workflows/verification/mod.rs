//! Per-operator verification: incident lookup, filing lookup through a remote session, then
//! scoring. Either lookup may fail; the run still produces a report that says which steps fell
//! back.

mod filings;
mod incidents;
mod retry;
mod router;
mod service;

pub use filings::{parse_filings, primary_jurisdictions, FilingLookup, SessionFilingGateway};
pub use incidents::{
    incident_score, parse_incidents, IncidentSource, NtsbIncidentClient, RetryingIncidentSource,
};
pub use retry::RetryPolicy;
pub use router::verification_router;
pub use service::{
    AircraftProfile, FilingPath, FilingStepResult, IncidentStepResult, StepStatus,
    VerificationReport, VerificationRequest, VerificationService, VerificationStatus,
    DEFAULT_AIRCRAFT_AGE_YEARS, DEFAULT_OPERATOR_AGE_YEARS,
};

use std::future::Future;
use std::time::Duration;

/// Failure of a remote evidence lookup. Always absorbed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}")]
    Status { status: u16 },
    #[error("response malformed: {0}")]
    Malformed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Abandons `lookup` once `limit` elapses.
pub(crate) async fn within<T>(
    limit: Duration,
    lookup: impl Future<Output = Result<T, LookupError>>,
) -> Result<T, LookupError> {
    tokio::time::timeout(limit, lookup)
        .await
        .unwrap_or(Err(LookupError::Timeout(limit)))
}
