use super::matcher::MatchText;
use super::normalizer::normalize_name;
use crate::workflows::certification::CertificationSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;

/// How to reach an operator, as scraped from the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// One operator row from the scraped charter directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub company: String,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub certificate_number: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub certifications: CertificationSet,
    #[serde(default)]
    pub contact: ContactInfo,
}

impl OperatorRecord {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            locations: Vec::new(),
            certificate_number: None,
            jurisdiction: None,
            certifications: CertificationSet::default(),
            contact: ContactInfo::default(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.company)
    }

    /// Count of populated optional fields; duplicate rows keep the richest one.
    pub fn completeness(&self) -> usize {
        let optional = [
            self.certificate_number.is_some(),
            self.jurisdiction.is_some(),
            self.contact.telephone.is_some(),
            self.contact.email.is_some(),
            self.contact.website.is_some(),
        ];
        optional.iter().filter(|present| **present).count()
            + self.locations.len()
            + self.certifications.present_count()
    }
}

impl MatchText for OperatorRecord {
    fn match_text(&self) -> &str {
        &self.company
    }
}

/// Parses a directory export. Rows without a company name are skipped.
pub fn parse_directory<R: Read>(reader: R) -> Result<Vec<OperatorRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<DirectoryRow>() {
        let row = row?;
        if row.company.trim().is_empty() {
            continue;
        }
        records.push(row.into_record());
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    #[serde(rename = "Company")]
    company: String,
    #[serde(rename = "Locations", default, deserialize_with = "empty_string_as_none")]
    locations: Option<String>,
    #[serde(
        rename = "Certificate Number",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    certificate_number: Option<String>,
    #[serde(
        rename = "Jurisdiction",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    jurisdiction: Option<String>,
    #[serde(rename = "Part 135", default, deserialize_with = "empty_string_as_none")]
    part135: Option<String>,
    #[serde(rename = "Part 121", default, deserialize_with = "empty_string_as_none")]
    part121: Option<String>,
    #[serde(rename = "Wyvern", default, deserialize_with = "empty_string_as_none")]
    wyvern: Option<String>,
    #[serde(rename = "ARGUS", default, deserialize_with = "empty_string_as_none")]
    argus: Option<String>,
    #[serde(rename = "IS-BAO", default, deserialize_with = "empty_string_as_none")]
    is_bao: Option<String>,
    #[serde(rename = "ACSF/IAS", default, deserialize_with = "empty_string_as_none")]
    acsf_ias: Option<String>,
    #[serde(rename = "Telephone", default, deserialize_with = "empty_string_as_none")]
    telephone: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(rename = "Website", default, deserialize_with = "empty_string_as_none")]
    website: Option<String>,
}

impl DirectoryRow {
    fn into_record(self) -> OperatorRecord {
        let locations = self
            .locations
            .as_deref()
            .map(|raw| {
                raw.split(';')
                    .map(str::trim)
                    .filter(|location| !location.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        OperatorRecord {
            company: self.company.trim().to_string(),
            locations,
            certificate_number: self.certificate_number,
            jurisdiction: self.jurisdiction.map(|value| value.to_ascii_uppercase()),
            certifications: CertificationSet {
                part135: self.part135,
                part121: self.part121,
                wyvern: self.wyvern,
                argus: self.argus,
                is_bao: self.is_bao,
                acsf_ias: self.acsf_ias,
            },
            contact: ContactInfo {
                telephone: self.telephone,
                email: self.email,
                website: self.website,
            },
        }
    }
}

pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXPORT: &str = "\
Company,Locations,Certificate Number,Jurisdiction,Part 135,Part 121,Wyvern,ARGUS,IS-BAO,ACSF/IAS,Telephone,Email,Website
Acme Aviation LLC,Teterboro NJ; White Plains NY,AC1A123,nj,Yes,,Wingman,Platinum,Stage 2,,201-555-0100,ops@acme.example,
,Nowhere,,,,,,,,,,,
Harbor Jets,,,,,,N/A,,,,,,
";

    #[test]
    fn parses_rows_and_splits_locations() {
        let records = parse_directory(Cursor::new(EXPORT)).expect("parse directory");
        assert_eq!(records.len(), 2);

        let acme = &records[0];
        assert_eq!(acme.company, "Acme Aviation LLC");
        assert_eq!(acme.locations, vec!["Teterboro NJ", "White Plains NY"]);
        assert_eq!(acme.certificate_number.as_deref(), Some("AC1A123"));
        assert_eq!(acme.jurisdiction.as_deref(), Some("NJ"));
        assert_eq!(acme.certifications.wyvern.as_deref(), Some("Wingman"));
        assert_eq!(acme.certifications.part121, None);
        assert_eq!(acme.contact.email.as_deref(), Some("ops@acme.example"));
        assert_eq!(acme.contact.website, None);
    }

    #[test]
    fn sentinel_grades_do_not_count_toward_completeness() {
        let records = parse_directory(Cursor::new(EXPORT)).expect("parse directory");
        let harbor = &records[1];
        assert_eq!(harbor.certifications.wyvern.as_deref(), Some("N/A"));
        assert_eq!(harbor.completeness(), 0);
        assert!(records[0].completeness() > harbor.completeness());
    }
}
