use crate::infra::{
    live_verification_service, load_index, InMemoryFilingLookup, InMemoryIncidentSource,
};
use chrono::NaiveDate;
use clap::Args;
use fleet_trust::config::{AppConfig, VerificationConfig};
use fleet_trust::error::AppError;
use fleet_trust::telemetry;
use fleet_trust::workflows::evidence::{
    EventType, FilingRecord, FilingStatus, IncidentRecord, InjuryLevel,
};
use fleet_trust::workflows::identity::{FuzzyMatcher, IdentityResolution, OperatorIndex};
use fleet_trust::workflows::trust::{ScoreBreakdown, TrustScoreEngine};
use fleet_trust::workflows::verification::{VerificationReport, VerificationService};
use std::io::Cursor;
use std::sync::Arc;

const DEMO_DIRECTORY: &str = "\
Company,Locations,Certificate Number,Jurisdiction,Part 135,Part 121,Wyvern,ARGUS,IS-BAO,ACSF/IAS,Telephone,Email,Website
Summit Air Charter Inc.,Denver CO;Aspen CO,SUMA441C,CO,Yes,,Wingman PRO,Platinum Elite,Stage 3,Yes,303-555-0142,ops@summit.example,summit.example
Blue Sky Jets LLC,Scottsdale AZ,,AZ,Yes,,N/A,Gold,,,480-555-0199,,
Harbor Jets,Miami FL;Fort Lauderdale FL,HJTA902F,FL,Yes,,Registered Operator,,Stage 1,,,,
";

const DEMO_REGISTRY: &str = "\
Certificate Number,Holder Name,Jurisdiction,Issued On
SUMA441C,SUMMIT AIR CHARTER INC,CO,2004-09-01
BSJ7Q21X,BLUE SKY JETS,AZ,2019-01-15
HJTA902F,HARBOR JETS,FL,2011-03-30
";

const DEMO_OPERATORS: &[&str] = &[
    "Summit Air Charter",
    "Blue Skies Jets",
    "Harbor Jets LLC",
    "Northern Lights Helicopters",
];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Verify a single operator instead of the bundled roster.
    #[arg(long)]
    pub(crate) operator: Option<String>,
    /// Print full JSON reports instead of the summary.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// Operator name as it appears in the request or directory
    #[arg(long)]
    pub(crate) operator: String,
    /// Last-known jurisdiction to search when incident locations yield no filings
    #[arg(long)]
    pub(crate) jurisdiction: Option<String>,
    /// Print the full JSON report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// Operator name to resolve against the directory snapshot
    #[arg(long)]
    pub(crate) name: String,
}

pub(crate) async fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let VerifyArgs {
        operator,
        jurisdiction,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let index = load_index(&config)?;
    let service = live_verification_service(&config, index)?;
    let report = service
        .run_full_verification(&operator, jurisdiction.as_deref())
        .await;

    print_report(&report, json);
    Ok(())
}

pub(crate) fn run_resolve(args: ResolveArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let index = load_index(&config)?;
    if index.is_empty() {
        println!("No directory snapshot configured (set DIRECTORY_CSV); nothing to match against.");
    }

    let resolution = index.resolve(&args.name);
    println!("{}", describe_identity(&resolution));
    if let Some(profile) = resolution.profile() {
        println!(
            "  Jurisdiction: {}",
            profile.jurisdiction().unwrap_or("unknown")
        );
        if !profile.record.locations.is_empty() {
            println!("  Locations: {}", profile.record.locations.join(", "));
        }
        if let Some(link) = &profile.registry {
            println!(
                "  Registry certificate {} held by {}",
                link.entry.certificate_number, link.entry.holder_name
            );
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { operator, json } = args;
    let service = demo_service()?;

    println!(
        "Fleet trust demo ({} operators in the bundled directory; risk provider disabled)",
        service.index().len()
    );

    let operators = match operator {
        Some(operator) => vec![operator],
        None => DEMO_OPERATORS.iter().map(|name| name.to_string()).collect(),
    };

    for operator in operators {
        println!();
        let report = service.run_full_verification(&operator, None).await;
        print_report(&report, json);
    }

    Ok(())
}

/// Verification service over the bundled snapshots and in-memory evidence.
pub(crate) fn demo_service(
) -> Result<VerificationService<InMemoryIncidentSource, InMemoryFilingLookup>, AppError> {
    let index = OperatorIndex::from_readers(
        Cursor::new(DEMO_DIRECTORY),
        Some(Cursor::new(DEMO_REGISTRY)),
        FuzzyMatcher::default(),
    )?;

    let incidents = InMemoryIncidentSource::default()
        .with_incidents(
            "Summit Air Charter Inc.",
            vec![demo_incident(
                "CEN21LA117",
                "2021-02-11",
                EventType::Incident,
                InjuryLevel::Minor,
                "Aspen, CO, United States",
            )],
        )
        .with_incidents(
            "Blue Sky Jets LLC",
            vec![demo_incident(
                "WPR22FA064",
                "2022-12-04",
                EventType::Accident,
                InjuryLevel::Serious,
                "Henderson, NV, United States",
            )],
        );

    let filings = InMemoryFilingLookup::default()
        .with_filings(
            "CO",
            "Summit Air Charter Inc.",
            vec![demo_filing(
                "20231187733",
                "Summit Air Charter Inc.",
                "First Aviation Capital",
                "CO",
            )],
        )
        .with_filings("AZ", "Blue Sky Jets LLC", Vec::new())
        .with_filings(
            "FL",
            "Harbor Jets",
            vec![demo_filing(
                "201900412877",
                "Harbor Jets",
                "Gulfstream Leasing Trust",
                "FL",
            )],
        );

    Ok(VerificationService::new(
        Arc::new(incidents),
        Arc::new(filings),
        Arc::new(index),
        TrustScoreEngine::default(),
        VerificationConfig::default(),
    ))
}

fn demo_incident(
    event_id: &str,
    date: &str,
    event_type: EventType,
    injury_level: InjuryLevel,
    location: &str,
) -> IncidentRecord {
    IncidentRecord {
        event_id: event_id.to_string(),
        event_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        event_type,
        injury_level,
        location: Some(location.to_string()),
    }
}

fn demo_filing(file_number: &str, debtor: &str, secured_party: &str, state: &str) -> FilingRecord {
    FilingRecord {
        file_number: Some(file_number.to_string()),
        status: FilingStatus::Active,
        filing_date: NaiveDate::from_ymd_opt(2023, 5, 2),
        debtor: debtor.to_string(),
        secured_party: Some(secured_party.to_string()),
        collateral: Some("All aircraft, engines and spare parts".to_string()),
        jurisdiction: Some(state.to_string()),
    }
}

fn describe_identity(resolution: &IdentityResolution) -> String {
    match resolution {
        IdentityResolution::Exact { profile } => {
            format!("Identity: exact match -> {}", profile.record.company)
        }
        IdentityResolution::Fuzzy { profile, score, .. } => format!(
            "Identity: fuzzy match -> {} (score {:.2})",
            profile.record.company, score
        ),
        IdentityResolution::Unresolved { query, best_score } => format!(
            "Identity: '{}' unresolved (best candidate score {:.2})",
            query, best_score
        ),
    }
}

fn print_report(report: &VerificationReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Report unavailable: {}", err),
        }
        return;
    }

    println!("Verification report for {}", report.operator_name);
    println!("- {}", describe_identity(&report.identity));

    let incidents = &report.incident_result;
    println!(
        "- Incidents: {} on record | step score {:.0} | {:?}",
        incidents.incidents.len(),
        incidents.score,
        incidents.status
    );
    if let Some(warning) = &incidents.warning {
        println!("  Warning: {}", warning);
    }

    let filings = &report.filing_result;
    println!(
        "- Filings: {} found via {:?} path (searched: {})",
        filings.filings.len(),
        filings.path,
        if filings.jurisdictions_searched.is_empty() {
            "none".to_string()
        } else {
            filings.jurisdictions_searched.join(", ")
        }
    );
    for warning in &filings.warnings {
        println!("  Warning: {}", warning);
    }

    let certification = &report.certification;
    println!(
        "- Certifications: {} points across {} programs (synergy +{})",
        certification.points, certification.cert_count, certification.synergy_bonus
    );

    let trust = &report.trust_score;
    println!(
        "- FleetScore {:.1} | TailScore {:.1} | TrustScore {:.1} ({})",
        trust.fleet_score,
        trust.tail_score,
        trust.trust_score,
        trust.tier.label()
    );
    render_breakdown("Fleet", &trust.fleet_breakdown);
    render_breakdown("Tail", &trust.tail_breakdown);
    if let Some(summary) = trust
        .explanation
        .as_ref()
        .and_then(|explanation| explanation.summary.as_deref())
    {
        println!("  Summary: {}", summary);
    }

    println!(
        "- Status: {:?}{}",
        report.status,
        if report.used_fallback {
            " (fallback data used)"
        } else {
            ""
        }
    );
}

fn render_breakdown(label: &str, breakdown: &ScoreBreakdown) {
    println!("  {} deductions:", label);
    for entry in breakdown.entries.iter().filter(|entry| entry.deduction > 0.0) {
        let note = entry
            .details
            .as_deref()
            .or(entry.reasoning.as_deref())
            .unwrap_or("");
        println!("    - {:?}: -{:.1} {}", entry.category, entry.deduction, note);
    }
}
