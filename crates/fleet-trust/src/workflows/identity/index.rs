use super::directory::{parse_directory, OperatorRecord};
use super::matcher::{FuzzyMatcher, MatchText};
use super::normalizer::normalize_name;
use super::registry::{CertificateRegistry, RegistryLink};
use super::SnapshotImportError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A directory record together with whatever the registry could tell us about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorProfile {
    pub record: OperatorRecord,
    pub registry: Option<RegistryLink>,
}

impl OperatorProfile {
    /// Last-known issuing jurisdiction; the registry outranks the scraped directory.
    pub fn jurisdiction(&self) -> Option<&str> {
        self.registry
            .as_ref()
            .and_then(|link| link.entry.jurisdiction.as_deref())
            .or(self.record.jurisdiction.as_deref())
    }

    pub fn business_age_years(&self, as_of: NaiveDate) -> Option<f64> {
        self.registry
            .as_ref()
            .and_then(|link| link.entry.business_age_years(as_of))
    }
}

impl MatchText for OperatorProfile {
    fn match_text(&self) -> &str {
        &self.record.company
    }
}

/// Outcome of looking a free-text name up in the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IdentityResolution {
    Exact {
        profile: OperatorProfile,
    },
    Fuzzy {
        profile: OperatorProfile,
        score: f64,
        edit_similarity: f64,
        token_overlap: f64,
    },
    /// Nothing cleared the threshold. Never auto-linked.
    Unresolved { query: String, best_score: f64 },
}

impl IdentityResolution {
    pub fn profile(&self) -> Option<&OperatorProfile> {
        match self {
            IdentityResolution::Exact { profile } | IdentityResolution::Fuzzy { profile, .. } => {
                Some(profile)
            }
            IdentityResolution::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.profile().is_some()
    }
}

/// Read-only name index built once from the snapshots and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct OperatorIndex {
    profiles: Vec<OperatorProfile>,
    by_name: HashMap<String, usize>,
    matcher: FuzzyMatcher,
}

impl OperatorIndex {
    pub fn empty(matcher: FuzzyMatcher) -> Self {
        Self {
            profiles: Vec::new(),
            by_name: HashMap::new(),
            matcher,
        }
    }

    /// Collapses duplicate spellings onto one profile per normalized name, keeping the most
    /// complete record, then links each survivor to the registry.
    pub fn build(
        records: Vec<OperatorRecord>,
        registry: &CertificateRegistry,
        matcher: FuzzyMatcher,
    ) -> Self {
        let mut best: Vec<OperatorRecord> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for record in records {
            let key = record.normalized_name();
            if key.is_empty() {
                continue;
            }

            match by_name.get(&key) {
                Some(&position) => {
                    if record.completeness() > best[position].completeness() {
                        best[position] = record;
                    }
                }
                None => {
                    by_name.insert(key, best.len());
                    best.push(record);
                }
            }
        }

        let profiles: Vec<OperatorProfile> = best
            .into_iter()
            .map(|record| {
                let registry = registry.link(&record, &matcher);
                OperatorProfile { record, registry }
            })
            .collect();

        let linked = profiles.iter().filter(|p| p.registry.is_some()).count();
        info!(
            operators = profiles.len(),
            registry_linked = linked,
            "operator index built"
        );

        Self {
            profiles,
            by_name,
            matcher,
        }
    }

    pub fn from_readers<D: Read, G: Read>(
        directory: D,
        registry: Option<G>,
        matcher: FuzzyMatcher,
    ) -> Result<Self, SnapshotImportError> {
        let records = parse_directory(directory)?;
        let registry = match registry {
            Some(reader) => CertificateRegistry::from_reader(reader)?,
            None => CertificateRegistry::default(),
        };
        Ok(Self::build(records, &registry, matcher))
    }

    /// Loads whichever snapshot files are configured. No directory means an empty index.
    pub fn from_paths(
        directory: Option<&Path>,
        registry: Option<&Path>,
        matcher: FuzzyMatcher,
    ) -> Result<Self, SnapshotImportError> {
        let Some(directory) = directory else {
            if registry.is_some() {
                warn!("registry snapshot configured without a directory snapshot; ignoring it");
            }
            return Ok(Self::empty(matcher));
        };

        let directory = std::fs::File::open(directory)?;
        let registry = registry.map(std::fs::File::open).transpose()?;
        Self::from_readers(directory, registry, matcher)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profiles(&self) -> &[OperatorProfile] {
        &self.profiles
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    pub fn resolve(&self, name: &str) -> IdentityResolution {
        let key = normalize_name(name);
        if let Some(profile) = self.by_name.get(&key).and_then(|p| self.profiles.get(*p)) {
            return IdentityResolution::Exact {
                profile: profile.clone(),
            };
        }

        match self.matcher.best_match(name, &self.profiles) {
            Some(candidate) => IdentityResolution::Fuzzy {
                profile: candidate.record.clone(),
                score: candidate.score,
                edit_similarity: candidate.edit_similarity,
                token_overlap: candidate.token_overlap,
            },
            None => {
                let best_score = self.matcher.best_score(name, &self.profiles);
                warn!(query = name, best_score, "operator identity unresolved");
                IdentityResolution::Unresolved {
                    query: name.to_string(),
                    best_score,
                }
            }
        }
    }
}
