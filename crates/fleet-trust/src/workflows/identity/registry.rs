use super::directory::{empty_string_as_none, OperatorRecord};
use super::matcher::{FuzzyMatcher, MatchText};
use super::normalizer::normalize_certificate;
use crate::workflows::evidence::{parse_evidence_date, years_between};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

/// A certificate holder as published by the government registry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub certificate_number: String,
    pub holder_name: String,
    pub jurisdiction: Option<String>,
    pub issued_on: Option<NaiveDate>,
}

impl RegistryEntry {
    pub fn business_age_years(&self, as_of: NaiveDate) -> Option<f64> {
        self.issued_on.map(|issued| years_between(issued, as_of))
    }
}

impl MatchText for RegistryEntry {
    fn match_text(&self) -> &str {
        &self.holder_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LinkMethod {
    CertificateNumber,
    HolderName { score: f64 },
}

/// A directory record tied to its registry entry, with how the tie was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryLink {
    pub entry: RegistryEntry,
    pub method: LinkMethod,
}

#[derive(Debug, Clone, Default)]
pub struct CertificateRegistry {
    entries: Vec<RegistryEntry>,
    by_certificate: HashMap<String, usize>,
}

impl CertificateRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        let mut by_certificate = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            let key = normalize_certificate(&entry.certificate_number);
            if !key.is_empty() {
                by_certificate.entry(key).or_insert(position);
            }
        }

        Self {
            entries,
            by_certificate,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        parse_registry(reader).map(Self::new)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_certificate(&self, number: &str) -> Option<&RegistryEntry> {
        let key = normalize_certificate(number);
        self.by_certificate
            .get(&key)
            .and_then(|position| self.entries.get(*position))
    }

    /// Certificate number wins; otherwise the holder name must clear the matcher threshold.
    pub fn link(&self, record: &OperatorRecord, matcher: &FuzzyMatcher) -> Option<RegistryLink> {
        if let Some(entry) = record
            .certificate_number
            .as_deref()
            .and_then(|number| self.by_certificate(number))
        {
            return Some(RegistryLink {
                entry: entry.clone(),
                method: LinkMethod::CertificateNumber,
            });
        }

        matcher
            .best_match(&record.company, &self.entries)
            .map(|candidate| RegistryLink {
                entry: candidate.record.clone(),
                method: LinkMethod::HolderName {
                    score: candidate.score,
                },
            })
    }
}

pub fn parse_registry<R: Read>(reader: R) -> Result<Vec<RegistryEntry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for row in csv_reader.deserialize::<RegistryRow>() {
        let row = row?;
        if row.certificate_number.is_empty() && row.holder_name.is_empty() {
            continue;
        }

        entries.push(RegistryEntry {
            certificate_number: row.certificate_number,
            holder_name: row.holder_name,
            jurisdiction: row.jurisdiction.map(|value| value.to_ascii_uppercase()),
            issued_on: row.issued_on.as_deref().and_then(parse_evidence_date),
        });
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct RegistryRow {
    #[serde(rename = "Certificate Number")]
    certificate_number: String,
    #[serde(rename = "Holder Name")]
    holder_name: String,
    #[serde(
        rename = "Jurisdiction",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    jurisdiction: Option<String>,
    #[serde(rename = "Issued On", default, deserialize_with = "empty_string_as_none")]
    issued_on: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const REGISTRY: &str = "\
Certificate Number,Holder Name,Jurisdiction,Issued On
AC1A123,ACME AVIATION,nj,2012-05-01
HJ9B456,Harbor Jets Inc,FL,03/15/2020
";

    fn registry() -> CertificateRegistry {
        CertificateRegistry::from_reader(Cursor::new(REGISTRY)).expect("parse registry")
    }

    #[test]
    fn links_by_certificate_before_name() {
        let mut record = OperatorRecord::new("Completely Different Name");
        record.certificate_number = Some("ac1a-123".to_string());

        let link = registry()
            .link(&record, &FuzzyMatcher::default())
            .expect("certificate link");
        assert_eq!(link.method, LinkMethod::CertificateNumber);
        assert_eq!(link.entry.holder_name, "ACME AVIATION");
        assert_eq!(link.entry.jurisdiction.as_deref(), Some("NJ"));
    }

    #[test]
    fn falls_back_to_holder_name() {
        let record = OperatorRecord::new("Harbor Jets LLC");
        let link = registry()
            .link(&record, &FuzzyMatcher::default())
            .expect("name link");
        assert!(matches!(link.method, LinkMethod::HolderName { score } if score > 0.99));
        assert_eq!(
            link.entry.issued_on,
            NaiveDate::from_ymd_opt(2020, 3, 15)
        );
    }

    #[test]
    fn unknown_operator_stays_unlinked() {
        let record = OperatorRecord::new("Polar Freight Express");
        assert!(registry().link(&record, &FuzzyMatcher::default()).is_none());
    }

    #[test]
    fn business_age_counts_from_issue_date() {
        let registry = registry();
        let entry = registry.by_certificate("AC1A123").expect("entry");
        let as_of = NaiveDate::from_ymd_opt(2022, 5, 1).expect("date");
        let age = entry.business_age_years(as_of).expect("issued");
        assert!((age - 10.0).abs() < 0.01);
    }
}
