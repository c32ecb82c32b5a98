use super::{grade_text, CertificationSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationProgram {
    Part135,
    Part121,
    Wyvern,
    Argus,
    IsBao,
    AcsfIas,
}

/// Points per program and grade, plus the multi-certification synergy ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationPointTable {
    pub part135: u32,
    pub part121: u32,
    pub wyvern_wingman: u32,
    pub wyvern_other: u32,
    pub argus_platinum: u32,
    pub argus_gold_plus: u32,
    pub argus_gold: u32,
    pub argus_other: u32,
    pub is_bao_stage3: u32,
    pub is_bao_stage2: u32,
    pub is_bao_other: u32,
    pub acsf_ias: u32,
    /// `(minimum cert count, bonus)`; every rung reached is added.
    pub synergy: Vec<(usize, u32)>,
}

impl Default for CertificationPointTable {
    fn default() -> Self {
        Self {
            part135: 20,
            part121: 25,
            wyvern_wingman: 100,
            wyvern_other: 75,
            argus_platinum: 90,
            argus_gold_plus: 80,
            argus_gold: 70,
            argus_other: 50,
            is_bao_stage3: 85,
            is_bao_stage2: 65,
            is_bao_other: 45,
            acsf_ias: 30,
            synergy: vec![(3, 50), (5, 75), (7, 100)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationAward {
    pub program: CertificationProgram,
    pub grade: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationScore {
    pub points: u32,
    pub cert_count: usize,
    pub synergy_bonus: u32,
    pub awards: Vec<CertificationAward>,
}

#[derive(Debug, Clone, Default)]
pub struct CertificationScorer {
    table: CertificationPointTable,
}

impl CertificationScorer {
    pub fn new(table: CertificationPointTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CertificationPointTable {
        &self.table
    }

    pub fn score(&self, certs: &CertificationSet) -> CertificationScore {
        let table = &self.table;
        let mut awards = Vec::new();

        let mut award = |program, grade: String, points| {
            awards.push(CertificationAward {
                program,
                grade,
                points,
            });
        };

        if let Some(grade) = grade_text(&certs.part135) {
            award(CertificationProgram::Part135, grade, table.part135);
        }

        if let Some(grade) = grade_text(&certs.part121) {
            award(CertificationProgram::Part121, grade, table.part121);
        }

        if let Some(grade) = grade_text(&certs.wyvern) {
            let points = if grade.contains("wingman") {
                table.wyvern_wingman
            } else {
                table.wyvern_other
            };
            award(CertificationProgram::Wyvern, grade, points);
        }

        if let Some(grade) = grade_text(&certs.argus) {
            // Platinum first: it outranks every gold grade.
            let points = if grade.contains("platinum") {
                table.argus_platinum
            } else if grade.contains("gold plus") || grade.contains("gold+") {
                table.argus_gold_plus
            } else if grade.contains("gold") {
                table.argus_gold
            } else {
                table.argus_other
            };
            award(CertificationProgram::Argus, grade, points);
        }

        if let Some(grade) = grade_text(&certs.is_bao) {
            let points = if grade.contains("stage 3") {
                table.is_bao_stage3
            } else if grade.contains("stage 2") {
                table.is_bao_stage2
            } else {
                table.is_bao_other
            };
            award(CertificationProgram::IsBao, grade, points);
        }

        if let Some(grade) = grade_text(&certs.acsf_ias) {
            award(CertificationProgram::AcsfIas, grade, table.acsf_ias);
        }

        let cert_count = awards.len();
        let synergy_bonus = table
            .synergy
            .iter()
            .filter(|(minimum, _)| cert_count >= *minimum)
            .map(|(_, bonus)| bonus)
            .sum::<u32>();
        let points = awards.iter().map(|award| award.points).sum::<u32>() + synergy_bonus;

        CertificationScore {
            points,
            cert_count,
            synergy_bonus,
            awards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn empty_set_scores_zero() {
        let score = CertificationScorer::default().score(&CertificationSet::default());
        assert_eq!(score.points, 0);
        assert_eq!(score.cert_count, 0);
        assert!(score.awards.is_empty());
    }

    #[test]
    fn grades_map_to_table_points() {
        let scorer = CertificationScorer::default();
        let certs = CertificationSet {
            part135: grade("Yes"),
            wyvern: grade("Wyvern Wingman"),
            ..CertificationSet::default()
        };
        let score = scorer.score(&certs);
        assert_eq!(score.points, 120);
        assert_eq!(score.cert_count, 2);
        assert_eq!(score.synergy_bonus, 0);

        let argus = |value: &str| {
            scorer
                .score(&CertificationSet {
                    argus: grade(value),
                    ..CertificationSet::default()
                })
                .points
        };
        assert_eq!(argus("ARGUS Platinum"), 90);
        assert_eq!(argus("Gold Plus"), 80);
        assert_eq!(argus("Gold"), 70);
        assert_eq!(argus("Silver"), 50);
        assert_eq!(argus("N/A"), 0);
    }

    #[test]
    fn synergy_rungs_are_additive() {
        let certs = CertificationSet {
            part135: grade("Yes"),
            part121: grade("Yes"),
            wyvern: grade("Registered"),
            argus: grade("Gold"),
            is_bao: grade("Stage 1"),
            acsf_ias: grade("Yes"),
        };
        let score = CertificationScorer::default().score(&certs);
        assert_eq!(score.cert_count, 6);
        assert_eq!(score.synergy_bonus, 125);
        assert_eq!(score.points, 20 + 25 + 75 + 70 + 45 + 30 + 125);
    }

    #[test]
    fn three_programs_earn_first_rung() {
        let certs = CertificationSet {
            part135: grade("Yes"),
            argus: grade("Platinum"),
            is_bao: grade("Stage 3"),
            ..CertificationSet::default()
        };
        let score = CertificationScorer::default().score(&certs);
        assert_eq!(score.synergy_bonus, 50);
        assert_eq!(score.points, 20 + 90 + 85 + 50);
    }
}
