use serde::{Deserialize, Serialize};

pub const INITIAL_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionCategory {
    FinancialRisk,
    LegalRisk,
    OperatorAge,
    RecentAccidents,
    Certification,
    AircraftAge,
    OwnershipMismatch,
    FractionalOwnership,
    IncidentHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub category: DeductionCategory,
    pub deduction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl BreakdownEntry {
    pub fn detailed(category: DeductionCategory, deduction: f64, details: String) -> Self {
        Self {
            category,
            deduction,
            details: Some(details),
            reasoning: None,
        }
    }

    pub fn reasoned(category: DeductionCategory, deduction: f64, reasoning: String) -> Self {
        Self {
            category,
            deduction,
            details: None,
            reasoning: Some(reasoning),
        }
    }
}

/// Itemized deductions from a starting score of 100.
///
/// `initial_score - sum(deductions) == raw_score`; `final_score` is `raw_score` clamped to
/// `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub initial_score: f64,
    pub entries: Vec<BreakdownEntry>,
    pub raw_score: f64,
    pub final_score: f64,
}

impl ScoreBreakdown {
    pub fn from_entries(entries: Vec<BreakdownEntry>) -> Self {
        let total: f64 = entries.iter().map(|entry| entry.deduction).sum();
        let raw_score = INITIAL_SCORE - total;

        Self {
            initial_score: INITIAL_SCORE,
            entries,
            raw_score,
            final_score: raw_score.clamp(0.0, INITIAL_SCORE),
        }
    }

    pub fn total_deductions(&self) -> f64 {
        self.entries.iter().map(|entry| entry.deduction).sum()
    }

    pub fn deductions_for(&self, category: DeductionCategory) -> f64 {
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .map(|entry| entry.deduction)
            .sum()
    }
}
