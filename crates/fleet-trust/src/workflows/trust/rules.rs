use super::breakdown::{BreakdownEntry, DeductionCategory, ScoreBreakdown};
use super::domain::{FleetScoreInputs, TailScoreInputs};
use crate::workflows::certification::certification_deduction;
use crate::workflows::evidence::{years_between, EventType, IncidentRecord, InjuryLevel};
use crate::workflows::identity::normalize_name;
use crate::workflows::risk::RiskAssessmentResult;
use chrono::NaiveDate;

const OPERATOR_AGE_GRACE_YEARS: f64 = 10.0;
const RECENT_ACCIDENT_WINDOW_YEARS: f64 = 5.0;
const RECENT_ACCIDENT_POINTS: f64 = 2.0;
const INCIDENT_AGE_GRACE_YEARS: f64 = 10.0;
const OWNERSHIP_MISMATCH_POINTS: f64 = 10.0;
const FRACTIONAL_OWNERSHIP_POINTS: f64 = 5.0;

/// FleetScore: financial risk, legal risk, operator age, recent accidents, certification.
pub fn score_fleet(
    inputs: &FleetScoreInputs,
    financial: &RiskAssessmentResult,
    legal: &RiskAssessmentResult,
    as_of: NaiveDate,
) -> ScoreBreakdown {
    let mut entries = Vec::with_capacity(5);

    entries.push(BreakdownEntry::reasoned(
        DeductionCategory::FinancialRisk,
        f64::from(financial.points),
        financial.reasoning.clone(),
    ));
    entries.push(BreakdownEntry::reasoned(
        DeductionCategory::LegalRisk,
        f64::from(legal.points),
        legal.reasoning.clone(),
    ));

    let age_deduction = operator_age_deduction(inputs.operator_age_years);
    entries.push(BreakdownEntry::detailed(
        DeductionCategory::OperatorAge,
        age_deduction,
        format!(
            "operator age {:.1} years; 2 points per year beyond {}",
            inputs.operator_age_years, OPERATOR_AGE_GRACE_YEARS
        ),
    ));

    let recent = recent_accident_count(&inputs.incidents, as_of);
    entries.push(BreakdownEntry::detailed(
        DeductionCategory::RecentAccidents,
        recent as f64 * RECENT_ACCIDENT_POINTS,
        format!("{recent} accident(s) within the last {RECENT_ACCIDENT_WINDOW_YEARS} years"),
    ));

    let certification = certification_deduction(&inputs.certifications);
    entries.push(BreakdownEntry::detailed(
        DeductionCategory::Certification,
        f64::from(certification.points),
        certification.details(),
    ));

    ScoreBreakdown::from_entries(entries)
}

/// TailScore: aircraft age band, ownership, fractional flag, then one entry per incident.
pub fn score_tail(inputs: &TailScoreInputs, as_of: NaiveDate) -> ScoreBreakdown {
    let mut entries = Vec::with_capacity(3 + inputs.incidents.len().max(1));

    entries.push(BreakdownEntry::detailed(
        DeductionCategory::AircraftAge,
        aircraft_age_deduction(inputs.aircraft_age_years),
        format!("aircraft age {:.1} years", inputs.aircraft_age_years),
    ));

    let mismatch = owner_mismatch(&inputs.operator_name, &inputs.registered_owner);
    entries.push(BreakdownEntry::detailed(
        DeductionCategory::OwnershipMismatch,
        if mismatch { OWNERSHIP_MISMATCH_POINTS } else { 0.0 },
        if mismatch {
            format!(
                "registered owner '{}' differs from operator '{}'",
                inputs.registered_owner, inputs.operator_name
            )
        } else {
            "registered owner matches operator".to_string()
        },
    ));

    entries.push(BreakdownEntry::detailed(
        DeductionCategory::FractionalOwnership,
        if inputs.fractional_owner {
            FRACTIONAL_OWNERSHIP_POINTS
        } else {
            0.0
        },
        if inputs.fractional_owner {
            "aircraft is under fractional ownership".to_string()
        } else {
            "whole ownership".to_string()
        },
    ));

    if inputs.incidents.is_empty() {
        entries.push(BreakdownEntry::detailed(
            DeductionCategory::IncidentHistory,
            0.0,
            "no incidents on record".to_string(),
        ));
    }

    for incident in &inputs.incidents {
        let event_age = incident
            .event_date
            .map(|date| years_between(date, as_of))
            .unwrap_or(0.0);
        entries.push(BreakdownEntry::detailed(
            DeductionCategory::IncidentHistory,
            incident_deduction(incident, as_of),
            format!(
                "{} {} {:.1} years ago, injuries {}",
                incident.event_id,
                incident.event_type.label(),
                event_age,
                incident.injury_level.label()
            ),
        ));
    }

    ScoreBreakdown::from_entries(entries)
}

pub fn operator_age_deduction(age_years: f64) -> f64 {
    (2.0 * (age_years - OPERATOR_AGE_GRACE_YEARS)).max(0.0)
}

/// Accidents dated within the window; undated events are not counted.
pub fn recent_accident_count(incidents: &[IncidentRecord], as_of: NaiveDate) -> usize {
    incidents
        .iter()
        .filter(|incident| incident.event_type == EventType::Accident)
        .filter_map(|incident| incident.event_date)
        .filter(|date| years_between(*date, as_of) <= RECENT_ACCIDENT_WINDOW_YEARS)
        .count()
}

/// Both ends of the age range are penalized equally: neither has an operating record.
pub fn aircraft_age_deduction(age_years: f64) -> f64 {
    match age_years {
        age if (2.0..5.0).contains(&age) => 0.0,
        age if (5.0..8.0).contains(&age) => 2.0,
        age if (8.0..12.0).contains(&age) => 4.0,
        age if (12.0..16.0).contains(&age) => 6.0,
        age if (16.0..20.0).contains(&age) => 8.0,
        _ => 10.0,
    }
}

pub fn injury_deduction(level: InjuryLevel) -> f64 {
    match level {
        InjuryLevel::None => 0.0,
        InjuryLevel::Minor => 10.0,
        InjuryLevel::Serious => 20.0,
        InjuryLevel::Fatal => 50.0,
    }
}

/// `(age + injury)`, doubled for accidents. Undated events count as current.
pub fn incident_deduction(incident: &IncidentRecord, as_of: NaiveDate) -> f64 {
    let event_age = incident
        .event_date
        .map(|date| years_between(date, as_of))
        .unwrap_or(0.0);
    let age = (2.0 * (event_age - INCIDENT_AGE_GRACE_YEARS)).max(0.0);
    let sum = age + injury_deduction(incident.injury_level);

    match incident.event_type {
        EventType::Accident => sum * 2.0,
        EventType::Incident => sum,
    }
}

/// An unknown (blank) registered owner is not a mismatch.
fn owner_mismatch(operator: &str, owner: &str) -> bool {
    let owner = normalize_name(owner);
    !owner.is_empty() && owner != normalize_name(operator)
}
