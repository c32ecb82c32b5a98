use super::{RiskEvidence, RiskKind};
use crate::workflows::evidence::FilingStatus;
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are a financial and legal risk analyst. \
Provide only a single integer score between 0 and 40.";

pub const NARRATIVE_SYSTEM_PROMPT: &str = "You are an aviation safety analyst. \
Explain charter operator scores to brokers in plain, concise prose.";

pub fn build_prompt(kind: RiskKind, evidence: &RiskEvidence) -> String {
    match kind {
        RiskKind::Financial => financial_prompt(evidence),
        RiskKind::Legal => legal_prompt(evidence),
    }
}

fn financial_prompt(evidence: &RiskEvidence) -> String {
    let mut prompt = format!(
        "Assess the financial risk of charter operator \"{}\".\n\
         Weigh active filings, bankruptcy history, the quality of secured parties and collateral, \
         and payment history implied by lapsed filings.\n\
         0 means no financial concern, 40 means severe concern.\n\n",
        evidence.operator_name
    );

    push_filings(&mut prompt, evidence);
    push_bankruptcies(&mut prompt, evidence);
    prompt.push_str("\nRespond with the score on its own line, then a short justification.");
    prompt
}

fn legal_prompt(evidence: &RiskEvidence) -> String {
    let mut prompt = format!(
        "Assess the legal risk of charter operator \"{}\".\n\
         Weigh filings, bankruptcy, safety incidents and regulatory violations by severity and recency.\n\
         0 means no legal concern, 40 means severe concern.\n\n",
        evidence.operator_name
    );

    push_filings(&mut prompt, evidence);
    push_bankruptcies(&mut prompt, evidence);

    if evidence.incidents.is_empty() {
        prompt.push_str("Incidents: none on record.\n");
    } else {
        prompt.push_str("Incidents:\n");
        for incident in &evidence.incidents {
            let _ = writeln!(
                prompt,
                "- {} {} on {}, injuries {}",
                incident.event_id,
                incident.event_type.label(),
                date_label(incident.event_date),
                incident.injury_level.label()
            );
        }
    }

    if evidence.violations.is_empty() {
        prompt.push_str("Violations: none on record.\n");
    } else {
        prompt.push_str("Violations:\n");
        for violation in &evidence.violations {
            let _ = writeln!(
                prompt,
                "- {} (severity {}) on {}",
                violation.description,
                violation.severity,
                date_label(violation.occurred_on)
            );
        }
    }

    prompt.push_str("\nRespond with the score on its own line, then a short justification.");
    prompt
}

fn push_filings(prompt: &mut String, evidence: &RiskEvidence) {
    if evidence.filings.is_empty() {
        prompt.push_str("Filings: none on record.\n");
        return;
    }

    let active = evidence
        .filings
        .iter()
        .filter(|filing| filing.status == FilingStatus::Active)
        .count();
    let lapsed = evidence
        .filings
        .iter()
        .filter(|filing| filing.status == FilingStatus::Lapsed)
        .count();
    let _ = writeln!(
        prompt,
        "Filings: {} total, {} active, {} lapsed.",
        evidence.filings.len(),
        active,
        lapsed
    );

    for filing in &evidence.filings {
        let _ = writeln!(
            prompt,
            "- {} filed {} by {}, collateral: {}",
            filing.status.label(),
            date_label(filing.filing_date),
            filing.secured_party.as_deref().unwrap_or("unknown secured party"),
            filing.collateral.as_deref().unwrap_or("unspecified")
        );
    }
}

fn push_bankruptcies(prompt: &mut String, evidence: &RiskEvidence) {
    if evidence.bankruptcies.is_empty() {
        prompt.push_str("Bankruptcies: none on record.\n");
        return;
    }

    prompt.push_str("Bankruptcies:\n");
    for bankruptcy in &evidence.bankruptcies {
        let _ = writeln!(
            prompt,
            "- chapter {} {} filed {}",
            bankruptcy.chapter.as_deref().unwrap_or("?"),
            bankruptcy.status,
            date_label(bankruptcy.filed_on)
        );
    }
}

fn date_label(date: Option<chrono::NaiveDate>) -> String {
    date.map(|date| date.to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}
