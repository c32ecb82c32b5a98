//! FleetScore, TailScore and their average, each with an itemized breakdown.

mod breakdown;
mod domain;
mod engine;
mod narrative;
mod rules;

pub use breakdown::{BreakdownEntry, DeductionCategory, ScoreBreakdown, INITIAL_SCORE};
pub use domain::{FleetScoreInputs, TailScoreInputs};
pub use engine::{TrustScoreEngine, TrustScoreResult};
pub use narrative::ScoreExplanation;
pub use rules::{
    aircraft_age_deduction, incident_deduction, injury_deduction, operator_age_deduction,
    recent_accident_count, score_fleet, score_tail,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTier {
    Pinnacle,
    Premier,
    Benchmark,
    Standard,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            ScoreTier::Pinnacle
        } else if score >= 80.0 {
            ScoreTier::Premier
        } else if score >= 70.0 {
            ScoreTier::Benchmark
        } else {
            ScoreTier::Standard
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Pinnacle => "Pinnacle",
            ScoreTier::Premier => "Premier",
            ScoreTier::Benchmark => "Benchmark",
            ScoreTier::Standard => "Standard",
        }
    }
}
