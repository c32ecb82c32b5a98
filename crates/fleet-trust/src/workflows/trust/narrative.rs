use super::breakdown::ScoreBreakdown;
use super::domain::{FleetScoreInputs, TailScoreInputs};
use super::engine::TrustScoreResult;
use crate::workflows::risk::RiskAssessmentAdapter;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Provider-written commentary on a scoring run. Never feeds back into the numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ScoreExplanation {
    pub fn is_empty(&self) -> bool {
        self.fleet.is_none() && self.tail.is_none() && self.summary.is_none()
    }
}

/// Asks the provider for fleet, tail and overall commentary concurrently.
pub(crate) async fn explain(
    risk: &RiskAssessmentAdapter,
    fleet: &FleetScoreInputs,
    tail: &TailScoreInputs,
    result: &TrustScoreResult,
) -> Option<ScoreExplanation> {
    risk.provider_name()?;

    let fleet_prompt = fleet_prompt(fleet, &result.fleet_breakdown);
    let tail_prompt = tail_prompt(tail, &result.tail_breakdown);
    let summary_prompt = summary_prompt(fleet, tail, result);
    let (fleet, tail, summary) = tokio::join!(
        risk.narrate("fleet", &fleet_prompt),
        risk.narrate("tail", &tail_prompt),
        risk.narrate("summary", &summary_prompt),
    );

    let explanation = ScoreExplanation {
        fleet,
        tail,
        summary,
    };
    (!explanation.is_empty()).then_some(explanation)
}

fn fleet_prompt(fleet: &FleetScoreInputs, breakdown: &ScoreBreakdown) -> String {
    let mut prompt = format!(
        "Explain why charter operator \"{}\" received a FleetScore of {:.1}/100.\n\
         Operator age: {:.1} years. Incidents on record: {}. Filings on record: {}. \
         Bankruptcies: {}. Violations: {}.\n",
        fleet.operator_name,
        breakdown.final_score,
        fleet.operator_age_years,
        fleet.incidents.len(),
        fleet.filings.len(),
        fleet.bankruptcies.len(),
        fleet.violations.len(),
    );
    push_deductions(&mut prompt, breakdown);
    prompt.push_str(
        "\nIn two or three sentences, name the main factors, any concerning or reassuring \
         patterns, and what the score means for operator reliability.",
    );
    prompt
}

fn tail_prompt(tail: &TailScoreInputs, breakdown: &ScoreBreakdown) -> String {
    let mut prompt = format!(
        "Explain why an aircraft operated by \"{}\" received a TailScore of {:.1}/100.\n\
         Aircraft age: {:.1} years. Registered owner: {}. Fractional ownership: {}. \
         Incidents on record: {}.\n",
        tail.operator_name,
        breakdown.final_score,
        tail.aircraft_age_years,
        tail.registered_owner,
        if tail.fractional_owner { "yes" } else { "no" },
        tail.incidents.len(),
    );
    push_deductions(&mut prompt, breakdown);
    prompt.push_str(
        "\nIn two or three sentences, say whether the aircraft age is appropriate, how \
         ownership affects the score, and what the score says about this aircraft.",
    );
    prompt
}

fn summary_prompt(
    fleet: &FleetScoreInputs,
    tail: &TailScoreInputs,
    result: &TrustScoreResult,
) -> String {
    format!(
        "Write an executive summary of the TrustScore for charter operator \"{}\".\n\
         TrustScore: {:.1}/100 ({} tier). FleetScore: {:.1}. TailScore: {:.1}.\n\
         Operator age: {:.1} years. Fleet incidents: {}. Filings: {}. Tail incidents: {}. \
         Aircraft age: {:.1} years.\n\
         In four to six sentences, give an overall assessment, the key strengths and \
         weaknesses, the main risks a charter broker should know, and whether you would \
         recommend booking this operator.",
        fleet.operator_name,
        result.trust_score,
        result.tier.label(),
        result.fleet_score,
        result.tail_score,
        fleet.operator_age_years,
        fleet.incidents.len(),
        fleet.filings.len(),
        tail.incidents.len(),
        tail.aircraft_age_years,
    )
}

fn push_deductions(prompt: &mut String, breakdown: &ScoreBreakdown) {
    let applied: Vec<_> = breakdown
        .entries
        .iter()
        .filter(|entry| entry.deduction > 0.0)
        .collect();
    if applied.is_empty() {
        prompt.push_str("Deductions: none.\n");
        return;
    }

    prompt.push_str("Deductions:\n");
    for entry in applied {
        let note = entry
            .details
            .as_deref()
            .or(entry.reasoning.as_deref())
            .unwrap_or("");
        let _ = writeln!(prompt, "- {:?}: -{:.1} {}", entry.category, entry.deduction, note);
    }
}
