use super::LookupError;
use crate::config::VerificationConfig;
use crate::workflows::evidence::{parse_evidence_date, FilingRecord, FilingStatus, IncidentRecord};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Lien search for one operator in one jurisdiction, backed by a remote automated session.
#[async_trait]
pub trait FilingLookup: Send + Sync {
    async fn lookup_filings(
        &self,
        operator_name: &str,
        jurisdiction: &str,
    ) -> Result<Vec<FilingRecord>, LookupError>;
}

/// Jurisdictions worth searching first: state codes of the operator's incident locations, in
/// first-seen order.
pub fn primary_jurisdictions(incidents: &[IncidentRecord]) -> Vec<String> {
    let mut jurisdictions: Vec<String> = Vec::new();
    for code in incidents.iter().filter_map(IncidentRecord::jurisdiction) {
        if !jurisdictions.contains(&code) {
            jurisdictions.push(code);
        }
    }
    jurisdictions
}

/// HTTP front for the automated filing-search session service.
pub struct SessionFilingGateway {
    client: reqwest::Client,
    url: Option<String>,
}

impl SessionFilingGateway {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LookupError::Transport(err.to_string()))?;
        Ok(Self { client, url })
    }

    pub fn from_config(config: &VerificationConfig) -> Result<Self, LookupError> {
        Self::new(config.filing_session_url.clone(), config.filing_timeout)
    }
}

#[async_trait]
impl FilingLookup for SessionFilingGateway {
    async fn lookup_filings(
        &self,
        operator_name: &str,
        jurisdiction: &str,
    ) -> Result<Vec<FilingRecord>, LookupError> {
        let Some(url) = self.url.as_deref() else {
            return Err(LookupError::Unavailable(
                "no filing session endpoint configured".to_string(),
            ));
        };

        let response = self
            .client
            .post(url)
            .json(&json!({
                "operator_name": operator_name,
                "jurisdiction": jurisdiction,
            }))
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
        parse_filings(&body, jurisdiction)
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    filings: Vec<RawFiling>,
}

#[derive(Debug, Deserialize)]
struct RawFiling {
    #[serde(default)]
    file_number: Option<String>,
    #[serde(default, alias = "debtor")]
    debtor_name: Option<String>,
    #[serde(default)]
    filing_date: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    secured_party: Option<String>,
    #[serde(default)]
    collateral: Option<String>,
}

/// Normalizes a session payload (`{"filings": [...]}`) into filing records.
pub fn parse_filings(body: &str, jurisdiction: &str) -> Result<Vec<FilingRecord>, LookupError> {
    let response: SessionResponse =
        serde_json::from_str(body).map_err(|err| LookupError::Malformed(err.to_string()))?;

    Ok(response
        .filings
        .into_iter()
        .map(|raw| FilingRecord {
            file_number: raw.file_number.filter(|value| !value.trim().is_empty()),
            status: raw
                .status
                .as_deref()
                .map(FilingStatus::normalize)
                .unwrap_or(FilingStatus::Unknown),
            filing_date: raw.filing_date.as_deref().and_then(parse_evidence_date),
            debtor: raw.debtor_name.unwrap_or_else(|| "Unknown".to_string()),
            secured_party: raw.secured_party.filter(|value| !value.trim().is_empty()),
            collateral: raw.collateral.filter(|value| !value.trim().is_empty()),
            jurisdiction: Some(jurisdiction.to_ascii_uppercase()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::evidence::{EventType, InjuryLevel};
    use chrono::NaiveDate;

    fn at(location: Option<&str>) -> IncidentRecord {
        IncidentRecord {
            event_id: "X".to_string(),
            event_date: None,
            event_type: EventType::Incident,
            injury_level: InjuryLevel::None,
            location: location.map(str::to_string),
        }
    }

    #[test]
    fn primary_jurisdictions_are_unique_in_order() {
        let incidents = vec![
            at(Some("Miami, FL, United States")),
            at(None),
            at(Some("Teterboro, NJ, United States")),
            at(Some("Opa-locka, fl, United States")),
        ];
        assert_eq!(primary_jurisdictions(&incidents), vec!["FL", "NJ"]);
    }

    #[test]
    fn session_payload_normalizes_statuses_and_dates() {
        let body = r#"{"filings": [
            {"file_number": "201806358547", "debtor_name": "ACME AVIATION LLC",
             "filing_date": "06/04/2018", "status": "Filed",
             "secured_party": "First Aero Bank", "collateral": ""},
            {"debtor": "ACME AVIATION", "filing_date": "Unknown", "status": "released"}
        ]}"#;
        let filings = parse_filings(body, "nj").expect("parse filings");
        assert_eq!(filings.len(), 2);
        assert_eq!(filings[0].status, FilingStatus::Active);
        assert_eq!(filings[0].filing_date, NaiveDate::from_ymd_opt(2018, 6, 4));
        assert_eq!(filings[0].collateral, None);
        assert_eq!(filings[0].jurisdiction.as_deref(), Some("NJ"));
        assert_eq!(filings[1].status, FilingStatus::Terminated);
        assert_eq!(filings[1].debtor, "ACME AVIATION");
        assert_eq!(filings[1].filing_date, None);
    }

    #[tokio::test]
    async fn unconfigured_gateway_is_unavailable() {
        let gateway = SessionFilingGateway::new(None, Duration::from_secs(1)).expect("client");
        let result = gateway.lookup_filings("Acme Aviation", "NJ").await;
        assert!(matches!(result, Err(LookupError::Unavailable(_))));
    }
}
