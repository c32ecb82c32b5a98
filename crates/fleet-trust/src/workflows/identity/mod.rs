//! Cross-source operator identity: name canonicalization, fuzzy matching and the snapshot
//! index the verification pipeline resolves names against.

mod directory;
mod index;
mod matcher;
mod normalizer;
mod registry;

pub use directory::{parse_directory, ContactInfo, OperatorRecord};
pub use index::{IdentityResolution, OperatorIndex, OperatorProfile};
pub use matcher::{
    resolve_identity, FuzzyMatcher, MatchCandidate, MatchConfig, MatchText, Similarity,
};
pub use normalizer::{name_tokens, normalize_certificate, normalize_name};
pub use registry::{
    parse_registry, CertificateRegistry, LinkMethod, RegistryEntry, RegistryLink,
};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotImportError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot CSV data: {0}")]
    Csv(#[from] csv::Error),
}
