use crate::workflows::certification::CertificationSet;
use crate::workflows::evidence::{
    BankruptcyRecord, FilingRecord, IncidentRecord, ViolationRecord,
};
use crate::workflows::risk::RiskEvidence;
use serde::{Deserialize, Serialize};

/// Operator-level evidence for one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetScoreInputs {
    pub operator_name: String,
    pub operator_age_years: f64,
    #[serde(default)]
    pub incidents: Vec<IncidentRecord>,
    #[serde(default)]
    pub filings: Vec<FilingRecord>,
    #[serde(default)]
    pub bankruptcies: Vec<BankruptcyRecord>,
    #[serde(default)]
    pub violations: Vec<ViolationRecord>,
    #[serde(default)]
    pub certifications: CertificationSet,
}

impl FleetScoreInputs {
    pub fn new(operator_name: impl Into<String>, operator_age_years: f64) -> Self {
        Self {
            operator_name: operator_name.into(),
            operator_age_years,
            incidents: Vec::new(),
            filings: Vec::new(),
            bankruptcies: Vec::new(),
            violations: Vec::new(),
            certifications: CertificationSet::default(),
        }
    }

    pub fn risk_evidence(&self) -> RiskEvidence {
        RiskEvidence {
            operator_name: self.operator_name.clone(),
            filings: self.filings.clone(),
            bankruptcies: self.bankruptcies.clone(),
            incidents: self.incidents.clone(),
            violations: self.violations.clone(),
        }
    }
}

/// Aircraft-level evidence for one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailScoreInputs {
    pub aircraft_age_years: f64,
    pub operator_name: String,
    pub registered_owner: String,
    #[serde(default)]
    pub fractional_owner: bool,
    #[serde(default)]
    pub incidents: Vec<IncidentRecord>,
}

impl TailScoreInputs {
    pub fn new(operator_name: impl Into<String>, aircraft_age_years: f64) -> Self {
        let operator_name = operator_name.into();
        Self {
            aircraft_age_years,
            registered_owner: operator_name.clone(),
            operator_name,
            fractional_owner: false,
            incidents: Vec::new(),
        }
    }
}
