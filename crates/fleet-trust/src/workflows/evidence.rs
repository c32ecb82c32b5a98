//! Evidence records gathered from the incident and filing providers.
//!
//! Provider payloads are messy: event types, injury levels and filing statuses arrive as
//! free text. Parsing is total; anything unrecognised lands on the mildest variant so a bad
//! record lowers confidence in the data, never the operator's score.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Accident,
    Incident,
}

impl EventType {
    /// Accepts full words and the provider's `ACC`/`INC` codes.
    pub fn parse(value: &str) -> Self {
        let lowered = value.trim().to_ascii_lowercase();
        if lowered == "acc" || lowered.contains("accident") {
            EventType::Accident
        } else {
            EventType::Incident
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventType::Accident => "Accident",
            EventType::Incident => "Incident",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InjuryLevel {
    None,
    Minor,
    Serious,
    Fatal,
}

impl InjuryLevel {
    pub fn parse(value: &str) -> Self {
        let lowered = value.trim().to_ascii_lowercase();
        if lowered.contains("fatal") {
            InjuryLevel::Fatal
        } else if lowered.contains("serious") {
            InjuryLevel::Serious
        } else if lowered.contains("minor") {
            InjuryLevel::Minor
        } else {
            InjuryLevel::None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InjuryLevel::None => "None",
            InjuryLevel::Minor => "Minor",
            InjuryLevel::Serious => "Serious",
            InjuryLevel::Fatal => "Fatal",
        }
    }
}

/// Government safety-event record for an operator or a single tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub event_id: String,
    pub event_date: Option<NaiveDate>,
    pub event_type: EventType,
    pub injury_level: InjuryLevel,
    #[serde(default)]
    pub location: Option<String>,
}

impl IncidentRecord {
    /// Two-letter state code from a `City, ST, Country` location, if present.
    pub fn jurisdiction(&self) -> Option<String> {
        self.location.as_deref()?.split(',').find_map(|part| {
            let part = part.trim();
            (part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
                .then(|| part.to_ascii_uppercase())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingStatus {
    Active,
    Lapsed,
    Terminated,
    Unknown,
}

impl FilingStatus {
    pub fn normalize(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "filed" | "current" | "valid" => FilingStatus::Active,
            "lapsed" | "expired" | "inactive" => FilingStatus::Lapsed,
            "terminated" | "cancelled" | "canceled" | "discharged" | "released" => {
                FilingStatus::Terminated
            }
            _ => FilingStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilingStatus::Active => "Active",
            FilingStatus::Lapsed => "Lapsed",
            FilingStatus::Terminated => "Terminated",
            FilingStatus::Unknown => "Unknown",
        }
    }
}

/// Registered lien or security interest against an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingRecord {
    #[serde(default)]
    pub file_number: Option<String>,
    pub status: FilingStatus,
    pub filing_date: Option<NaiveDate>,
    pub debtor: String,
    #[serde(default)]
    pub secured_party: Option<String>,
    #[serde(default)]
    pub collateral: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankruptcyRecord {
    pub chapter: Option<String>,
    pub status: String,
    pub filed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub description: String,
    pub severity: String,
    pub occurred_on: Option<NaiveDate>,
}

/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY` and RFC 3339 timestamps.
pub fn parse_evidence_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(date);
    }

    // Incident providers sometimes send timestamps without an offset.
    trimmed
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Fractional years elapsed between `from` and `as_of`, never negative.
pub fn years_between(from: NaiveDate, as_of: NaiveDate) -> f64 {
    let days = (as_of - from).num_days().max(0);
    days as f64 / 365.25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filing_status_synonyms_collapse() {
        assert_eq!(FilingStatus::normalize(" Filed "), FilingStatus::Active);
        assert_eq!(FilingStatus::normalize("EXPIRED"), FilingStatus::Lapsed);
        assert_eq!(FilingStatus::normalize("released"), FilingStatus::Terminated);
        assert_eq!(FilingStatus::normalize("pending"), FilingStatus::Unknown);
    }

    #[test]
    fn unrecognised_injury_text_is_lowest_tier() {
        assert_eq!(InjuryLevel::parse("FATAL"), InjuryLevel::Fatal);
        assert_eq!(InjuryLevel::parse("Serious"), InjuryLevel::Serious);
        assert_eq!(InjuryLevel::parse("unknown"), InjuryLevel::None);
        assert_eq!(EventType::parse("ACC"), EventType::Accident);
        assert_eq!(EventType::parse("INC"), EventType::Incident);
        assert_eq!(EventType::parse(""), EventType::Incident);
        assert_eq!(EventType::parse("Accident"), EventType::Accident);
    }

    #[test]
    fn evidence_dates_accept_provider_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 9);
        assert_eq!(parse_evidence_date("2021-03-09"), expected);
        assert_eq!(parse_evidence_date("03/09/2021"), expected);
        assert_eq!(parse_evidence_date("2021-03-09T14:00:00Z"), expected);
        assert_eq!(parse_evidence_date("2021-03-09T14:00:00"), expected);
        assert_eq!(parse_evidence_date("  "), None);
        assert_eq!(parse_evidence_date("Unknown"), None);
    }

    #[test]
    fn incident_location_yields_state_code() {
        let incident = IncidentRecord {
            event_id: "ERA22LA101".to_string(),
            event_date: None,
            event_type: EventType::Incident,
            injury_level: InjuryLevel::None,
            location: Some("Teterboro, nj, United States".to_string()),
        };
        assert_eq!(incident.jurisdiction().as_deref(), Some("NJ"));
    }
}
