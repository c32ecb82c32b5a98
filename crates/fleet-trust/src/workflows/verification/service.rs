use super::filings::{primary_jurisdictions, FilingLookup};
use super::incidents::{incident_score, IncidentSource};
use super::{within, LookupError};
use crate::config::VerificationConfig;
use crate::workflows::certification::{CertificationScore, CertificationScorer};
use crate::workflows::evidence::{FilingRecord, IncidentRecord};
use crate::workflows::identity::{IdentityResolution, OperatorIndex};
use crate::workflows::trust::{
    FleetScoreInputs, TailScoreInputs, TrustScoreEngine, TrustScoreResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_OPERATOR_AGE_YEARS: f64 = 10.0;
pub const DEFAULT_AIRCRAFT_AGE_YEARS: f64 = 5.0;

/// Optional aircraft facts; anything missing takes the documented default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftProfile {
    #[serde(default)]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub registered_owner: Option<String>,
    #[serde(default)]
    pub fractional_owner: Option<bool>,
    #[serde(default)]
    pub incidents: Option<Vec<IncidentRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub operator_name: String,
    #[serde(default)]
    pub fallback_jurisdiction: Option<String>,
    #[serde(default)]
    pub aircraft: Option<AircraftProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentStepResult {
    pub status: StepStatus,
    pub score: f64,
    pub incidents: Vec<IncidentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingPath {
    /// Filings found in a jurisdiction derived from incident locations.
    Primary,
    /// Primary search failed or came back empty; the last-known jurisdiction answered.
    Fallback,
    /// No jurisdiction could be searched successfully.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingStepResult {
    pub path: FilingPath,
    pub jurisdictions_searched: Vec<String>,
    pub filings: Vec<FilingRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    FullyVerified,
    PartiallyVerified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub operator_name: String,
    pub identity: IdentityResolution,
    pub incident_result: IncidentStepResult,
    pub filing_result: FilingStepResult,
    pub certification: CertificationScore,
    pub trust_score: TrustScoreResult,
    pub used_fallback: bool,
    pub status: VerificationStatus,
}

/// Sequences incident lookup, filing lookup and scoring for one operator at a time.
pub struct VerificationService<I, F> {
    incidents: Arc<I>,
    filings: Arc<F>,
    index: Arc<OperatorIndex>,
    engine: TrustScoreEngine,
    scorer: CertificationScorer,
    config: VerificationConfig,
}

impl<I, F> VerificationService<I, F>
where
    I: IncidentSource + 'static,
    F: FilingLookup + 'static,
{
    pub fn new(
        incidents: Arc<I>,
        filings: Arc<F>,
        index: Arc<OperatorIndex>,
        engine: TrustScoreEngine,
        config: VerificationConfig,
    ) -> Self {
        Self {
            incidents,
            filings,
            index,
            engine,
            scorer: CertificationScorer::default(),
            config,
        }
    }

    pub fn with_scorer(mut self, scorer: CertificationScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn index(&self) -> &OperatorIndex {
        &self.index
    }

    pub fn engine(&self) -> &TrustScoreEngine {
        &self.engine
    }

    pub fn scorer(&self) -> &CertificationScorer {
        &self.scorer
    }

    /// Verifies `operator_name` as of now.
    pub async fn run_full_verification(
        &self,
        operator_name: &str,
        fallback_jurisdiction: Option<&str>,
    ) -> VerificationReport {
        let request = VerificationRequest {
            operator_name: operator_name.to_string(),
            fallback_jurisdiction: fallback_jurisdiction.map(str::to_string),
            aircraft: None,
        };
        self.run(request, Utc::now()).await
    }

    pub async fn run(
        &self,
        request: VerificationRequest,
        calculated_at: DateTime<Utc>,
    ) -> VerificationReport {
        let identity = self.index.resolve(&request.operator_name);
        let profile = identity.profile();
        let operator_name = profile
            .map(|profile| profile.record.company.clone())
            .unwrap_or_else(|| request.operator_name.trim().to_string());

        if profile.is_none() {
            warn!(
                operator = %request.operator_name,
                "identity unresolved; scoring with default operator facts"
            );
        }

        let deadline = Instant::now() + self.config.verification_timeout;
        let incident_result = self.incident_step(&operator_name, deadline).await;

        let fallback_jurisdiction = request
            .fallback_jurisdiction
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_ascii_uppercase)
            .or_else(|| profile.and_then(|p| p.jurisdiction()).map(str::to_string));
        let filing_result = self
            .filing_step(
                &operator_name,
                &incident_result.incidents,
                fallback_jurisdiction.as_deref(),
                deadline,
            )
            .await;

        let as_of = calculated_at.date_naive();
        let certifications = profile
            .map(|profile| profile.record.certifications.clone())
            .unwrap_or_default();
        let fleet = FleetScoreInputs {
            operator_name: operator_name.clone(),
            operator_age_years: profile
                .and_then(|profile| profile.business_age_years(as_of))
                .unwrap_or(DEFAULT_OPERATOR_AGE_YEARS),
            incidents: incident_result.incidents.clone(),
            filings: filing_result.filings.clone(),
            bankruptcies: Vec::new(),
            violations: Vec::new(),
            certifications,
        };

        let aircraft = request.aircraft.unwrap_or_default();
        let tail = TailScoreInputs {
            aircraft_age_years: aircraft.age_years.unwrap_or(DEFAULT_AIRCRAFT_AGE_YEARS),
            operator_name: operator_name.clone(),
            registered_owner: aircraft
                .registered_owner
                .unwrap_or_else(|| operator_name.clone()),
            fractional_owner: aircraft.fractional_owner.unwrap_or(false),
            incidents: aircraft
                .incidents
                .unwrap_or_else(|| incident_result.incidents.clone()),
        };

        let certification = self.scorer.score(&fleet.certifications);
        let trust_score = self.engine.compute(&fleet, &tail, calculated_at).await;

        let used_fallback = filing_result.path != FilingPath::Primary;
        let fully_verified = identity.is_resolved()
            && incident_result.status == StepStatus::Completed
            && !used_fallback;
        let status = if fully_verified {
            VerificationStatus::FullyVerified
        } else {
            VerificationStatus::PartiallyVerified
        };

        info!(
            operator = %operator_name,
            trust_score = trust_score.trust_score,
            used_fallback,
            status = ?status,
            "verification finished"
        );

        VerificationReport {
            operator_name,
            identity,
            incident_result,
            filing_result,
            certification,
            trust_score,
            used_fallback,
            status,
        }
    }

    async fn incident_step(&self, operator_name: &str, deadline: Instant) -> IncidentStepResult {
        let limit = time_left(deadline)
            .unwrap_or(Duration::ZERO)
            .min(self.config.incident_timeout);
        let lookup = self.incidents.incidents_for(operator_name);
        match within(limit, lookup).await {
            Ok(incidents) => {
                info!(operator = operator_name, count = incidents.len(), "incident lookup complete");
                IncidentStepResult {
                    status: StepStatus::Completed,
                    score: incident_score(&incidents),
                    incidents,
                    warning: None,
                }
            }
            Err(err) => {
                warn!(operator = operator_name, error = %err, "incident lookup failed; assuming no incidents");
                IncidentStepResult {
                    status: StepStatus::Fallback,
                    score: incident_score(&[]),
                    incidents: Vec::new(),
                    warning: Some(format!("incident lookup failed: {err}")),
                }
            }
        }
    }

    async fn filing_step(
        &self,
        operator_name: &str,
        incidents: &[IncidentRecord],
        fallback_jurisdiction: Option<&str>,
        deadline: Instant,
    ) -> FilingStepResult {
        let mut searched = Vec::new();
        let mut warnings = Vec::new();
        let mut filings = Vec::new();

        let mut pending = primary_jurisdictions(incidents).into_iter();
        while let Some(jurisdiction) = pending.next() {
            let Some(left) = time_left(deadline) else {
                let skipped: Vec<String> = std::iter::once(jurisdiction).chain(pending.by_ref()).collect();
                warn!(operator = operator_name, skipped = ?skipped, "verification time budget exhausted");
                warnings.push(format!(
                    "verification time budget exhausted; skipped {}",
                    skipped.join(", ")
                ));
                break;
            };
            match self.lookup(operator_name, &jurisdiction, left).await {
                Ok(found) => filings.extend(found),
                Err(err) => {
                    warn!(operator = operator_name, jurisdiction = %jurisdiction, error = %err, "primary filing lookup failed");
                    warnings.push(format!("{jurisdiction}: {err}"));
                }
            }
            searched.push(jurisdiction);
        }

        if !filings.is_empty() {
            info!(operator = operator_name, count = filings.len(), "filings found in primary jurisdictions");
            return FilingStepResult {
                path: FilingPath::Primary,
                jurisdictions_searched: searched,
                filings,
                warnings,
            };
        }

        let Some(fallback) = fallback_jurisdiction else {
            warn!(operator = operator_name, "no fallback jurisdiction; filings unavailable");
            warnings.push("no fallback jurisdiction known".to_string());
            return FilingStepResult {
                path: FilingPath::Unavailable,
                jurisdictions_searched: searched,
                filings,
                warnings,
            };
        };

        let Some(left) = time_left(deadline) else {
            warn!(operator = operator_name, jurisdiction = fallback, "no time left for fallback filing lookup");
            warnings.push(format!(
                "verification time budget exhausted; skipped fallback {fallback}"
            ));
            return FilingStepResult {
                path: FilingPath::Unavailable,
                jurisdictions_searched: searched,
                filings,
                warnings,
            };
        };

        let fallback = fallback.to_string();
        let outcome = self.lookup(operator_name, &fallback, left).await;
        searched.push(fallback.clone());

        match outcome {
            Ok(found) => {
                info!(operator = operator_name, jurisdiction = %fallback, count = found.len(), "filing lookup used fallback jurisdiction");
                FilingStepResult {
                    path: FilingPath::Fallback,
                    jurisdictions_searched: searched,
                    filings: found,
                    warnings,
                }
            }
            Err(err) => {
                warn!(operator = operator_name, jurisdiction = %fallback, error = %err, "fallback filing lookup failed");
                warnings.push(format!("{fallback}: {err}"));
                FilingStepResult {
                    path: FilingPath::Unavailable,
                    jurisdictions_searched: searched,
                    filings: Vec::new(),
                    warnings,
                }
            }
        }
    }

    /// One jurisdiction search, bounded by the per-search limit and whatever budget is left.
    async fn lookup(
        &self,
        operator_name: &str,
        jurisdiction: &str,
        left: Duration,
    ) -> Result<Vec<FilingRecord>, LookupError> {
        let lookup = self.filings.lookup_filings(operator_name, jurisdiction);
        within(self.config.filing_timeout.min(left), lookup).await
    }
}

fn time_left(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
}
