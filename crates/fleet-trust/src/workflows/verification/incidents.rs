use super::retry::RetryPolicy;
use super::{within, LookupError};
use crate::config::VerificationConfig;
use crate::workflows::evidence::{
    parse_evidence_date, EventType, IncidentRecord, InjuryLevel,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const PER_INCIDENT_PENALTY: f64 = 5.0;
const SEVERE_INJURY_PENALTY: f64 = 15.0;
const RESULT_SET_SIZE: u32 = 50;

/// Safety-event history for an operator.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    async fn incidents_for(&self, operator_name: &str) -> Result<Vec<IncidentRecord>, LookupError>;
}

/// Incident step score: 100 less 5 per event and a further 15 per fatal or serious event.
pub fn incident_score(incidents: &[IncidentRecord]) -> f64 {
    let severe = incidents
        .iter()
        .filter(|incident| incident.injury_level >= InjuryLevel::Serious)
        .count() as f64;
    let score =
        100.0 - incidents.len() as f64 * PER_INCIDENT_PENALTY - severe * SEVERE_INJURY_PENALTY;
    score.max(0.0)
}

/// Client for the NTSB CAROL case query endpoint. One call is one HTTP attempt; wrap it in
/// [`RetryingIncidentSource`] for backoff.
pub struct NtsbIncidentClient {
    client: reqwest::Client,
    url: String,
}

impl NtsbIncidentClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &VerificationConfig) -> Result<Self, LookupError> {
        Self::new(config.incident_api_url.clone(), config.incident_attempt_timeout)
    }
}

#[async_trait]
impl IncidentSource for NtsbIncidentClient {
    async fn incidents_for(&self, operator_name: &str) -> Result<Vec<IncidentRecord>, LookupError> {
        let response = self
            .client
            .post(&self.url)
            .json(&query_payload(operator_name))
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;
        let incidents = parse_incidents(&body)?;
        tracing::debug!(operator = operator_name, count = incidents.len(), "incident query returned");
        Ok(incidents)
    }
}

/// Retries an incident source with backoff. Each attempt has its own time limit, so a hung
/// attempt still leaves room for the next one.
pub struct RetryingIncidentSource<S> {
    inner: S,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl<S: IncidentSource> RetryingIncidentSource<S> {
    pub fn new(inner: S, retry: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            inner,
            retry,
            attempt_timeout,
        }
    }

    pub fn from_config(inner: S, config: &VerificationConfig) -> Self {
        Self::new(
            inner,
            RetryPolicy::with_retries(config.incident_max_retries),
            config.incident_attempt_timeout,
        )
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: IncidentSource> IncidentSource for RetryingIncidentSource<S> {
    async fn incidents_for(&self, operator_name: &str) -> Result<Vec<IncidentRecord>, LookupError> {
        let inner = &self.inner;
        let limit = self.attempt_timeout;
        self.retry
            .run("incident query", move || {
                within(limit, inner.incidents_for(operator_name))
            })
            .await
    }
}

fn query_payload(operator_name: &str) -> Value {
    json!({
        "ResultSetSize": RESULT_SET_SIZE,
        "ResultSetOffset": 0,
        "QueryGroups": [{
            "QueryRules": [{
                "RuleType": "Simple",
                "Values": [operator_name],
                "Columns": ["AviationOperation.OperatorName"],
                "Operator": "is",
                "selectedOption": {
                    "FieldName": "OperatorName",
                    "DisplayText": "Operator name",
                    "Columns": ["AviationOperation.OperatorName"],
                    "Selectable": true,
                    "InputType": "Text",
                    "RuleType": 0,
                    "TargetCollection": "cases",
                },
            }],
            "AndOr": "and",
        }],
        "AndOr": "and",
        "SortDescending": true,
        "TargetCollection": "cases",
    })
}

#[derive(Debug, Deserialize)]
struct CaseResponse {
    #[serde(rename = "Results", default)]
    results: Vec<CaseResult>,
}

#[derive(Debug, Deserialize)]
struct CaseResult {
    #[serde(rename = "Fields", default)]
    fields: Vec<CaseField>,
}

#[derive(Debug, Deserialize)]
struct CaseField {
    #[serde(rename = "FieldName")]
    name: String,
    #[serde(rename = "Values", default)]
    values: Vec<Value>,
}

impl CaseResult {
    fn field(&self, name: &str) -> Option<String> {
        let value = self
            .fields
            .iter()
            .find(|field| field.name == name)?
            .values
            .first()?;

        let text = match value {
            Value::String(text) => text.trim().to_string(),
            Value::Null => return None,
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }

    fn into_incident(self) -> IncidentRecord {
        let location = [self.field("City"), self.field("State"), self.field("Country")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        IncidentRecord {
            event_id: self.field("NtsbNo").unwrap_or_else(|| "UNKNOWN".to_string()),
            event_date: self.field("EventDate").as_deref().and_then(parse_evidence_date),
            event_type: self
                .field("EventType")
                .map(|value| EventType::parse(&value))
                .unwrap_or(EventType::Incident),
            injury_level: self
                .field("HighestInjuryLevel")
                .map(|value| InjuryLevel::parse(&value))
                .unwrap_or(InjuryLevel::None),
            location: (!location.is_empty()).then(|| location.join(", ")),
        }
    }
}

/// Parses a CAROL `Results[].Fields[]` body into incident records.
pub fn parse_incidents(body: &str) -> Result<Vec<IncidentRecord>, LookupError> {
    let response: CaseResponse =
        serde_json::from_str(body).map_err(|err| LookupError::Malformed(err.to_string()))?;
    Ok(response
        .results
        .into_iter()
        .map(CaseResult::into_incident)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Hangs on the first `stalls` calls, then answers with no incidents.
    struct Stalling {
        stalls: u32,
        calls: AtomicU32,
    }

    impl Stalling {
        fn new(stalls: u32) -> Self {
            Self {
                stalls,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IncidentSource for Stalling {
        async fn incidents_for(&self, _operator_name: &str) -> Result<Vec<IncidentRecord>, LookupError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.stalls {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(Vec::new())
        }
    }

    fn quick_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
        }
    }

    const BODY: &str = r#"{
        "ResultListCount": 2,
        "Results": [
            { "Fields": [
                { "FieldName": "NtsbNo", "Values": ["ERA22LA101"] },
                { "FieldName": "EventDate", "Values": ["2022-02-11T00:00:00"] },
                { "FieldName": "EventType", "Values": ["ACC"] },
                { "FieldName": "HighestInjuryLevel", "Values": ["Fatal"] },
                { "FieldName": "City", "Values": ["Teterboro"] },
                { "FieldName": "State", "Values": ["NJ"] },
                { "FieldName": "Country", "Values": ["United States"] }
            ] },
            { "Fields": [
                { "FieldName": "NtsbNo", "Values": ["CEN19IA044"] },
                { "FieldName": "EventDate", "Values": [] },
                { "FieldName": "EventType", "Values": ["Incident"] },
                { "FieldName": "HighestInjuryLevel", "Values": [null] }
            ] }
        ]
    }"#;

    #[test]
    fn parses_case_fields() {
        let incidents = parse_incidents(BODY).expect("parse body");
        assert_eq!(incidents.len(), 2);

        let first = &incidents[0];
        assert_eq!(first.event_id, "ERA22LA101");
        assert_eq!(first.event_date, NaiveDate::from_ymd_opt(2022, 2, 11));
        assert_eq!(first.injury_level, InjuryLevel::Fatal);
        assert_eq!(first.location.as_deref(), Some("Teterboro, NJ, United States"));
        assert_eq!(first.jurisdiction().as_deref(), Some("NJ"));

        let second = &incidents[1];
        assert_eq!(second.event_date, None);
        assert_eq!(second.injury_level, InjuryLevel::None);
        assert_eq!(second.location, None);
    }

    #[test]
    fn malformed_body_is_a_lookup_error() {
        assert!(matches!(
            parse_incidents("<html>maintenance</html>"),
            Err(LookupError::Malformed(_))
        ));
        assert!(parse_incidents("{}").expect("empty body").is_empty());
    }

    #[test]
    fn score_counts_events_and_severity() {
        assert_eq!(incident_score(&[]), 100.0);
        let incidents = parse_incidents(BODY).expect("parse body");
        assert_eq!(incident_score(&incidents), 100.0 - 10.0 - 15.0);
    }

    #[tokio::test]
    async fn hung_attempt_is_cut_short_and_retried() {
        let source =
            RetryingIncidentSource::new(Stalling::new(1), quick_retry(2), Duration::from_millis(20));

        let incidents = tokio::time::timeout(
            Duration::from_secs(5),
            source.incidents_for("Summit Air Charter"),
        )
        .await
        .expect("retry finishes well before the hung attempt would")
        .expect("second attempt succeeds");

        assert!(incidents.is_empty());
        assert_eq!(source.inner().calls(), 2);
    }

    #[tokio::test]
    async fn every_attempt_hanging_reports_attempt_timeout() {
        let source =
            RetryingIncidentSource::new(Stalling::new(u32::MAX), quick_retry(1), Duration::from_millis(10));

        let err = source
            .incidents_for("Summit Air Charter")
            .await
            .expect_err("all attempts hang");

        assert_eq!(err, LookupError::Timeout(Duration::from_millis(10)));
        assert_eq!(source.inner().calls(), 2);
    }
}
