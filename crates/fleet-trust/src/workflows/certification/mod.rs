//! Certification signals derived from directory grades.
//!
//! Two independent dimensions read the same fields: the additive [`CertificationScorer`]
//! rewards breadth of programs, while [`certification_deduction`] feeds FleetScore with the
//! single best safety-audit tier. Keep them apart.

mod deduction;
mod scorer;

pub use deduction::{certification_deduction, ArgusTier, CertificationDeduction, WyvernTier};
pub use scorer::{
    CertificationAward, CertificationPointTable, CertificationProgram, CertificationScore,
    CertificationScorer,
};

use serde::{Deserialize, Serialize};

const ABSENT_SENTINELS: &[&str] = &["n/a", "na", "no", "none", "-", "false"];

/// Free-text certification grades as they appear in the operator directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationSet {
    #[serde(default)]
    pub part135: Option<String>,
    #[serde(default)]
    pub part121: Option<String>,
    #[serde(default)]
    pub wyvern: Option<String>,
    #[serde(default)]
    pub argus: Option<String>,
    #[serde(default)]
    pub is_bao: Option<String>,
    #[serde(default)]
    pub acsf_ias: Option<String>,
}

impl CertificationSet {
    pub fn present_count(&self) -> usize {
        [
            &self.part135,
            &self.part121,
            &self.wyvern,
            &self.argus,
            &self.is_bao,
            &self.acsf_ias,
        ]
        .into_iter()
        .filter(|grade| grade_text(grade).is_some())
        .count()
    }
}

/// Lowercased grade, or `None` for blanks and "no"/"N/A" style sentinels.
pub(crate) fn grade_text(grade: &Option<String>) -> Option<String> {
    let lowered = grade.as_deref()?.trim().to_ascii_lowercase();
    if lowered.is_empty() || ABSENT_SENTINELS.contains(&lowered.as_str()) {
        None
    } else {
        Some(lowered)
    }
}

/// True when `word` appears in `grade` as a whole alphanumeric token.
pub(crate) fn has_token(grade: &str, word: &str) -> bool {
    grade
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == word)
}
