use super::breakdown::ScoreBreakdown;
use super::domain::{FleetScoreInputs, TailScoreInputs};
use super::narrative::{explain, ScoreExplanation};
use super::rules::{score_fleet, score_tail};
use super::ScoreTier;
use crate::workflows::risk::{RiskAssessmentAdapter, RiskKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Complete, immutable outcome of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScoreResult {
    pub fleet_score: f64,
    pub tail_score: f64,
    pub trust_score: f64,
    pub tier: ScoreTier,
    pub fleet_breakdown: ScoreBreakdown,
    pub tail_breakdown: ScoreBreakdown,
    pub calculated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<ScoreExplanation>,
}

impl TrustScoreResult {
    pub fn from_breakdowns(
        fleet_breakdown: ScoreBreakdown,
        tail_breakdown: ScoreBreakdown,
        calculated_at: DateTime<Utc>,
    ) -> Self {
        let fleet_score = fleet_breakdown.final_score;
        let tail_score = tail_breakdown.final_score;
        let trust_score = (fleet_score + tail_score) / 2.0;

        Self {
            fleet_score,
            tail_score,
            trust_score,
            tier: ScoreTier::from_score(trust_score),
            fleet_breakdown,
            tail_breakdown,
            calculated_at,
            explanation: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrustScoreEngine {
    risk: RiskAssessmentAdapter,
}

impl TrustScoreEngine {
    pub fn new(risk: RiskAssessmentAdapter) -> Self {
        Self { risk }
    }

    pub fn risk(&self) -> &RiskAssessmentAdapter {
        &self.risk
    }

    /// Runs both risk assessments concurrently, then the pure fleet and tail rules. With a
    /// provider configured, the result also carries written commentary.
    pub async fn compute(
        &self,
        fleet: &FleetScoreInputs,
        tail: &TailScoreInputs,
        calculated_at: DateTime<Utc>,
    ) -> TrustScoreResult {
        let evidence = fleet.risk_evidence();
        let (financial, legal) = tokio::join!(
            self.risk.assess(RiskKind::Financial, &evidence),
            self.risk.assess(RiskKind::Legal, &evidence),
        );

        let as_of = calculated_at.date_naive();
        let mut result = TrustScoreResult::from_breakdowns(
            score_fleet(fleet, &financial, &legal, as_of),
            score_tail(tail, as_of),
            calculated_at,
        );

        info!(
            operator = %fleet.operator_name,
            fleet_score = result.fleet_score,
            tail_score = result.tail_score,
            trust_score = result.trust_score,
            tier = result.tier.label(),
            "trust score computed"
        );

        result.explanation = explain(&self.risk, fleet, tail, &result).await;
        result
    }
}

impl Default for TrustScoreEngine {
    fn default() -> Self {
        Self::new(RiskAssessmentAdapter::unconfigured())
    }
}
