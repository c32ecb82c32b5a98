use async_trait::async_trait;
use fleet_trust::config::AppConfig;
use fleet_trust::error::AppError;
use fleet_trust::workflows::evidence::{FilingRecord, IncidentRecord};
use fleet_trust::workflows::identity::{normalize_name, FuzzyMatcher, OperatorIndex};
use fleet_trust::workflows::risk::RiskAssessmentAdapter;
use fleet_trust::workflows::trust::TrustScoreEngine;
use fleet_trust::workflows::verification::{
    FilingLookup, IncidentSource, LookupError, NtsbIncidentClient, RetryingIncidentSource,
    SessionFilingGateway, VerificationService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type LiveVerificationService =
    VerificationService<RetryingIncidentSource<NtsbIncidentClient>, SessionFilingGateway>;

/// Loads the configured directory and registry snapshots into a shared index.
pub(crate) fn load_index(config: &AppConfig) -> Result<Arc<OperatorIndex>, AppError> {
    let index = OperatorIndex::from_paths(
        config.snapshots.directory_csv.as_deref(),
        config.snapshots.registry_csv.as_deref(),
        FuzzyMatcher::new(config.matching),
    )?;
    Ok(Arc::new(index))
}

pub(crate) fn live_verification_service(
    config: &AppConfig,
    index: Arc<OperatorIndex>,
) -> Result<LiveVerificationService, AppError> {
    let incidents = Arc::new(RetryingIncidentSource::from_config(
        NtsbIncidentClient::from_config(&config.verification)?,
        &config.verification,
    ));
    let filings = Arc::new(SessionFilingGateway::from_config(&config.verification)?);
    let risk = RiskAssessmentAdapter::from_config(&config.risk);

    info!(
        operators = index.len(),
        risk_provider = risk.provider_name().unwrap_or("none"),
        filing_session = config.verification.filing_session_url.is_some(),
        "verification service assembled"
    );

    Ok(VerificationService::new(
        incidents,
        filings,
        index,
        TrustScoreEngine::new(risk),
        config.verification.clone(),
    ))
}

/// Incident history keyed by normalized operator name.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIncidentSource {
    by_operator: HashMap<String, Vec<IncidentRecord>>,
}

impl InMemoryIncidentSource {
    pub(crate) fn with_incidents(mut self, operator: &str, incidents: Vec<IncidentRecord>) -> Self {
        self.by_operator.insert(normalize_name(operator), incidents);
        self
    }
}

#[async_trait]
impl IncidentSource for InMemoryIncidentSource {
    async fn incidents_for(&self, operator_name: &str) -> Result<Vec<IncidentRecord>, LookupError> {
        Ok(self
            .by_operator
            .get(&normalize_name(operator_name))
            .cloned()
            .unwrap_or_default())
    }
}

/// Filings keyed by jurisdiction, then normalized debtor name. Jurisdictions that were never
/// seeded behave like a session that could not be opened.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFilingLookup {
    by_jurisdiction: HashMap<String, HashMap<String, Vec<FilingRecord>>>,
}

impl InMemoryFilingLookup {
    pub(crate) fn with_filings(
        mut self,
        jurisdiction: &str,
        operator: &str,
        filings: Vec<FilingRecord>,
    ) -> Self {
        self.by_jurisdiction
            .entry(jurisdiction.to_ascii_uppercase())
            .or_default()
            .insert(normalize_name(operator), filings);
        self
    }
}

#[async_trait]
impl FilingLookup for InMemoryFilingLookup {
    async fn lookup_filings(
        &self,
        operator_name: &str,
        jurisdiction: &str,
    ) -> Result<Vec<FilingRecord>, LookupError> {
        let Some(registry) = self.by_jurisdiction.get(&jurisdiction.to_ascii_uppercase()) else {
            return Err(LookupError::Unavailable(format!(
                "no filing session for {jurisdiction}"
            )));
        };

        Ok(registry
            .get(&normalize_name(operator_name))
            .cloned()
            .unwrap_or_default())
    }
}
