use super::{grade_text, has_token, CertificationSet};
use serde::{Deserialize, Serialize};

/// ARGUS audit rating, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgusTier {
    PlatinumElite,
    Platinum,
    GoldPlus,
    Gold,
    None,
}

impl ArgusTier {
    pub fn from_grade(grade: &Option<String>) -> Self {
        let Some(grade) = grade_text(grade) else {
            return ArgusTier::None;
        };

        if grade.contains("platinum") && grade.contains("elite") {
            ArgusTier::PlatinumElite
        } else if grade.contains("platinum") {
            ArgusTier::Platinum
        } else if grade.contains("gold plus") || grade.contains("gold+") {
            ArgusTier::GoldPlus
        } else {
            // Plain gold, or a grade we do not recognise: lowest certified tier.
            ArgusTier::Gold
        }
    }

    pub fn deduction(self) -> u8 {
        match self {
            ArgusTier::PlatinumElite => 0,
            ArgusTier::Platinum => 2,
            ArgusTier::GoldPlus => 4,
            ArgusTier::Gold => 6,
            ArgusTier::None => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArgusTier::PlatinumElite => "ARGUS Platinum Elite",
            ArgusTier::Platinum => "ARGUS Platinum",
            ArgusTier::GoldPlus => "ARGUS Gold Plus",
            ArgusTier::Gold => "ARGUS Gold",
            ArgusTier::None => "no ARGUS rating",
        }
    }
}

/// Wyvern safety rating, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WyvernTier {
    WingmanPro,
    Wingman,
    RegisteredOperator,
    None,
}

impl WyvernTier {
    pub fn from_grade(grade: &Option<String>) -> Self {
        let Some(grade) = grade_text(grade) else {
            return WyvernTier::None;
        };

        if grade.contains("wingman") && has_token(&grade, "pro") {
            WyvernTier::WingmanPro
        } else if grade.contains("wingman") {
            WyvernTier::Wingman
        } else {
            WyvernTier::RegisteredOperator
        }
    }

    pub fn deduction(self) -> u8 {
        match self {
            WyvernTier::WingmanPro => 2,
            WyvernTier::Wingman => 4,
            WyvernTier::RegisteredOperator => 6,
            WyvernTier::None => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WyvernTier::WingmanPro => "Wyvern Wingman PRO",
            WyvernTier::Wingman => "Wyvern Wingman",
            WyvernTier::RegisteredOperator => "Wyvern Registered Operator",
            WyvernTier::None => "no Wyvern rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationDeduction {
    pub points: u8,
    pub argus: ArgusTier,
    pub wyvern: WyvernTier,
}

impl CertificationDeduction {
    pub fn details(&self) -> String {
        format!(
            "{} ({}), {} ({}); best applies",
            self.argus.label(),
            self.argus.deduction(),
            self.wyvern.label(),
            self.wyvern.deduction()
        )
    }
}

/// FleetScore certification deduction: the better of the ARGUS and Wyvern tiers.
pub fn certification_deduction(certs: &CertificationSet) -> CertificationDeduction {
    let argus = ArgusTier::from_grade(&certs.argus);
    let wyvern = WyvernTier::from_grade(&certs.wyvern);

    CertificationDeduction {
        points: argus.deduction().min(wyvern.deduction()),
        argus,
        wyvern,
    }
}
