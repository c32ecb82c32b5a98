//! Scoring properties: breakdown arithmetic, certification monotonicity, risk defaults and
//! the end-to-end trust score for a baseline operator and aircraft.

use chrono::{NaiveDate, TimeZone, Utc};

use fleet_trust::workflows::certification::{
    certification_deduction, CertificationScorer, CertificationSet,
};
use fleet_trust::workflows::evidence::{EventType, IncidentRecord, InjuryLevel};
use async_trait::async_trait;
use fleet_trust::workflows::risk::{
    ProviderError, RiskAssessmentAdapter, RiskAssessmentResult, RiskEvidence, RiskKind,
    RiskProvenance, RiskProvider, NARRATIVE_SYSTEM_PROMPT,
};
use std::sync::Arc;
use std::time::Duration;
use fleet_trust::workflows::trust::{
    aircraft_age_deduction, score_fleet, score_tail, DeductionCategory, FleetScoreInputs,
    ScoreTier, TailScoreInputs, TrustScoreEngine,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

fn incident(
    event_type: EventType,
    injury_level: InjuryLevel,
    event_date: Option<NaiveDate>,
) -> IncidentRecord {
    IncidentRecord {
        event_id: "WPR20FA077".to_string(),
        event_date,
        event_type,
        injury_level,
        location: Some("Van Nuys, CA, United States".to_string()),
    }
}

fn with_grade(field: &str, grade: Option<&str>) -> CertificationSet {
    let grade = grade.map(str::to_string);
    let mut certs = CertificationSet::default();
    match field {
        "part135" => certs.part135 = grade,
        "part121" => certs.part121 = grade,
        "wyvern" => certs.wyvern = grade,
        "argus" => certs.argus = grade,
        "is_bao" => certs.is_bao = grade,
        "acsf_ias" => certs.acsf_ias = grade,
        other => panic!("unknown field {other}"),
    }
    certs
}

#[tokio::test]
async fn baseline_operator_and_aircraft_score_ninety() {
    let engine = TrustScoreEngine::new(RiskAssessmentAdapter::unconfigured());
    let fleet = FleetScoreInputs::new("Acme Aviation", 5.0);
    let tail = TailScoreInputs::new("Acme Aviation", 1.5);
    let calculated_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let result = engine.compute(&fleet, &tail, calculated_at).await;

    assert_eq!(result.fleet_score, 90.0);
    assert_eq!(result.tail_score, 90.0);
    assert_eq!(result.trust_score, 90.0);
    assert_eq!(result.tier, ScoreTier::Pinnacle);
    assert_eq!(result.calculated_at, calculated_at);
    assert!(result.explanation.is_none());
    assert_eq!(
        result
            .fleet_breakdown
            .deductions_for(DeductionCategory::Certification),
        10.0
    );
    assert_eq!(
        result
            .tail_breakdown
            .deductions_for(DeductionCategory::AircraftAge),
        10.0
    );

    let financial = &result.fleet_breakdown.entries[0];
    assert_eq!(financial.category, DeductionCategory::FinancialRisk);
    assert_eq!(financial.deduction, 0.0);
    assert!(financial
        .reasoning
        .as_deref()
        .is_some_and(|reason| reason.contains("no client configured")));
}

#[test]
fn fatal_accident_two_years_old_alone_costs_one_hundred() {
    let mut tail = TailScoreInputs::new("Acme Aviation", 3.0);
    tail.incidents = vec![incident(
        EventType::Accident,
        InjuryLevel::Fatal,
        NaiveDate::from_ymd_opt(2023, 6, 1),
    )];

    let breakdown = score_tail(&tail, as_of());
    assert_eq!(
        breakdown.deductions_for(DeductionCategory::IncidentHistory),
        100.0
    );
    assert_eq!(breakdown.raw_score, 0.0);
    assert_eq!(breakdown.final_score, 0.0);
}

#[test]
fn aircraft_age_extremes_are_penalized_equally() {
    assert_eq!(aircraft_age_deduction(6.0), 2.0);
    assert_eq!(aircraft_age_deduction(1.5), 10.0);
    assert_eq!(aircraft_age_deduction(25.0), 10.0);
}

#[test]
fn breakdowns_rederive_and_clamp() {
    let risks = [
        RiskAssessmentResult::no_client(RiskKind::Financial),
        RiskAssessmentResult {
            points: 40,
            reasoning: "multiple active liens".to_string(),
            provenance: RiskProvenance::Provider("canned".to_string()),
        },
    ];
    let incident_sets = [
        Vec::new(),
        vec![
            incident(
                EventType::Accident,
                InjuryLevel::Serious,
                NaiveDate::from_ymd_opt(2022, 1, 10),
            ),
            incident(EventType::Incident, InjuryLevel::Minor, None),
            incident(
                EventType::Accident,
                InjuryLevel::Fatal,
                NaiveDate::from_ymd_opt(1998, 3, 2),
            ),
        ],
    ];

    for operator_age in [0.0, 9.5, 14.0, 60.0] {
        for aircraft_age in [0.5, 4.0, 9.0, 30.0] {
            for incidents in &incident_sets {
                for risk in &risks {
                    let mut fleet = FleetScoreInputs::new("Acme Aviation", operator_age);
                    fleet.incidents = incidents.clone();
                    let mut tail = TailScoreInputs::new("Acme Aviation", aircraft_age);
                    tail.registered_owner = "Leasing Trust One".to_string();
                    tail.fractional_owner = true;
                    tail.incidents = incidents.clone();

                    for breakdown in [
                        score_fleet(&fleet, risk, risk, as_of()),
                        score_tail(&tail, as_of()),
                    ] {
                        assert_eq!(breakdown.initial_score, 100.0);
                        assert!(
                            (breakdown.initial_score
                                - breakdown.total_deductions()
                                - breakdown.raw_score)
                                .abs()
                                < 1e-9
                        );
                        assert!((0.0..=100.0).contains(&breakdown.final_score));
                        assert!(breakdown.entries.iter().all(|entry| entry.deduction >= 0.0));
                    }
                }
            }
        }
    }
}

#[test]
fn better_grades_never_lower_certification_points() {
    let scorer = CertificationScorer::default();
    let ladders: [(&str, &[Option<&str>]); 6] = [
        ("part135", &[None, Some("Yes")]),
        ("part121", &[None, Some("Yes")]),
        ("wyvern", &[None, Some("N/A"), Some("Registered"), Some("Wingman")]),
        (
            "argus",
            &[None, Some("No"), Some("Silver"), Some("Gold"), Some("Gold Plus"), Some("Platinum")],
        ),
        ("is_bao", &[None, Some("Stage 1"), Some("Stage 2"), Some("Stage 3")]),
        ("acsf_ias", &[None, Some("-"), Some("IAS")]),
    ];

    let base = CertificationSet {
        part135: Some("Yes".to_string()),
        is_bao: Some("Stage 2".to_string()),
        ..CertificationSet::default()
    };

    for (field, grades) in ladders {
        let mut previous = 0;
        for grade in grades {
            let alone = scorer.score(&with_grade(field, *grade));
            assert!(
                alone.points >= previous,
                "{field} {grade:?} scored {} after {previous}",
                alone.points
            );
            previous = alone.points;
        }

        let mut previous = 0;
        for grade in grades {
            let mut certs = base.clone();
            let single = with_grade(field, *grade);
            match field {
                "part135" => certs.part135 = single.part135,
                "part121" => certs.part121 = single.part121,
                "wyvern" => certs.wyvern = single.wyvern,
                "argus" => certs.argus = single.argus,
                "is_bao" => certs.is_bao = single.is_bao,
                _ => certs.acsf_ias = single.acsf_ias,
            }
            let points = scorer.score(&certs).points;
            assert!(points >= previous, "{field} {grade:?} lowered combined points");
            previous = points;
        }
    }
}

#[test]
fn deduction_table_is_independent_of_additive_points() {
    let certs = CertificationSet {
        part135: Some("Yes".to_string()),
        part121: Some("Yes".to_string()),
        is_bao: Some("Stage 3".to_string()),
        acsf_ias: Some("Yes".to_string()),
        ..CertificationSet::default()
    };
    let score = CertificationScorer::default().score(&certs);
    assert_eq!(score.cert_count, 4);
    assert_eq!(score.synergy_bonus, 50);
    assert_eq!(certification_deduction(&certs).points, 10);
}

#[tokio::test]
async fn risk_without_provider_is_zero_with_reasoning() {
    let adapter = RiskAssessmentAdapter::unconfigured();
    for kind in [RiskKind::Financial, RiskKind::Legal] {
        let result = adapter.assess(kind, &RiskEvidence::default()).await;
        assert_eq!(result.points, 0);
        assert!(!result.reasoning.is_empty());
        assert_eq!(result.provenance, RiskProvenance::NoClient);
    }
}

/// Scores every risk prompt 12 and answers commentary prompts by subject.
struct Analyst;

#[async_trait]
impl RiskProvider for Analyst {
    fn name(&self) -> &str {
        "analyst"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        if system != NARRATIVE_SYSTEM_PROMPT {
            return Ok("12\nModerate exposure.".to_string());
        }
        let reply = if prompt.contains("FleetScore of") {
            "Fleet commentary."
        } else if prompt.contains("TailScore of") {
            "Tail commentary."
        } else {
            "Executive summary."
        };
        Ok(reply.to_string())
    }
}

#[tokio::test]
async fn configured_provider_adds_commentary_without_moving_scores() {
    let adapter = RiskAssessmentAdapter::new(Some(Arc::new(Analyst)), Duration::from_secs(5));
    let engine = TrustScoreEngine::new(adapter);
    let fleet = FleetScoreInputs::new("Acme Aviation", 5.0);
    let tail = TailScoreInputs::new("Acme Aviation", 1.5);
    let calculated_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let result = engine.compute(&fleet, &tail, calculated_at).await;

    assert_eq!(
        result
            .fleet_breakdown
            .deductions_for(DeductionCategory::FinancialRisk),
        12.0
    );
    assert_eq!(result.tail_score, 90.0);
    let explanation = result.explanation.expect("provider configured");
    assert_eq!(explanation.fleet.as_deref(), Some("Fleet commentary."));
    assert_eq!(explanation.tail.as_deref(), Some("Tail commentary."));
    assert_eq!(explanation.summary.as_deref(), Some("Executive summary."));

    let json = serde_json::to_value(&engine.compute(&fleet, &tail, calculated_at).await)
        .expect("serialize result");
    assert_eq!(json["explanation"]["summary"], "Executive summary.");
}
