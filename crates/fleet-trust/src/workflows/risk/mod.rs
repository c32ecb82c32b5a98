//! Financial and legal risk judgments from interchangeable language-model providers.
//!
//! The adapter never fails: an absent provider, a transport error, a timeout or unusable
//! output all collapse to a zero-point result whose reasoning says what happened.

mod extract;
mod prompts;
mod providers;

pub use extract::extract_score;
pub use prompts::{build_prompt, NARRATIVE_SYSTEM_PROMPT, SYSTEM_PROMPT};
pub use providers::{build_provider, AnthropicProvider, ChatCompletionsProvider};

use crate::config::{RiskConfig, RiskProviderKind};
use crate::workflows::evidence::{
    BankruptcyRecord, FilingRecord, IncidentRecord, ViolationRecord,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const MAX_RISK_POINTS: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    Financial,
    Legal,
}

impl RiskKind {
    pub fn label(self) -> &'static str {
        match self {
            RiskKind::Financial => "financial",
            RiskKind::Legal => "legal",
        }
    }
}

/// Where a risk figure came from: `"no-client"`, a provider name, or `"error"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RiskProvenance {
    NoClient,
    Provider(String),
    Error,
}

impl From<RiskProvenance> for String {
    fn from(value: RiskProvenance) -> Self {
        match value {
            RiskProvenance::NoClient => "no-client".to_string(),
            RiskProvenance::Provider(name) => name,
            RiskProvenance::Error => "error".to_string(),
        }
    }
}

impl From<String> for RiskProvenance {
    fn from(value: String) -> Self {
        match value.as_str() {
            "no-client" => RiskProvenance::NoClient,
            "error" => RiskProvenance::Error,
            _ => RiskProvenance::Provider(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessmentResult {
    pub points: u8,
    pub reasoning: String,
    pub provenance: RiskProvenance,
}

impl RiskAssessmentResult {
    pub fn no_client(kind: RiskKind) -> Self {
        Self {
            points: 0,
            reasoning: format!("no client configured; {} risk not assessed", kind.label()),
            provenance: RiskProvenance::NoClient,
        }
    }

    pub fn failed(kind: RiskKind, error: &ProviderError) -> Self {
        Self {
            points: 0,
            reasoning: format!("{} risk assessment failed: {error}", kind.label()),
            provenance: RiskProvenance::Error,
        }
    }
}

/// Evidence handed to the model. Financial prompts read filings and bankruptcies; legal
/// prompts read all four lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskEvidence {
    pub operator_name: String,
    #[serde(default)]
    pub filings: Vec<FilingRecord>,
    #[serde(default)]
    pub bankruptcies: Vec<BankruptcyRecord>,
    #[serde(default)]
    pub incidents: Vec<IncidentRecord>,
    #[serde(default)]
    pub violations: Vec<ViolationRecord>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no risk provider configured")]
    NotConfigured,
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider output had no usable score: {0}")]
    Malformed(String),
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// One chat-style model backend.
#[async_trait]
pub trait RiskProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Uniform `assess(kind, evidence)` over whichever provider is configured.
#[derive(Clone)]
pub struct RiskAssessmentAdapter {
    provider: Option<Arc<dyn RiskProvider>>,
    timeout: Duration,
}

impl fmt::Debug for RiskAssessmentAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskAssessmentAdapter")
            .field("provider", &self.provider_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RiskAssessmentAdapter {
    pub fn new(provider: Option<Arc<dyn RiskProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn unconfigured() -> Self {
        Self::new(None, RiskConfig::default().timeout)
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        let provider = match build_provider(config) {
            Ok(provider) => Some(provider),
            Err(ProviderError::NotConfigured) if config.provider == RiskProviderKind::None => None,
            Err(err) => {
                warn!(
                    provider = config.provider.label(),
                    error = %err,
                    "risk assessment disabled; scores will carry zero risk deductions"
                );
                None
            }
        };
        Self::new(provider, config.timeout)
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|provider| provider.name())
    }

    pub async fn assess(&self, kind: RiskKind, evidence: &RiskEvidence) -> RiskAssessmentResult {
        let Some(provider) = self.provider.as_deref() else {
            return RiskAssessmentResult::no_client(kind);
        };

        let prompt = build_prompt(kind, evidence);
        let outcome = match tokio::time::timeout(
            self.timeout,
            provider.complete(SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        let scored = outcome.and_then(|content| {
            let raw = extract_score(&content)?;
            Ok((raw, content))
        });

        match scored {
            Ok((raw, content)) => {
                let points = raw.min(u64::from(MAX_RISK_POINTS)) as u8;
                if raw > u64::from(MAX_RISK_POINTS) {
                    warn!(
                        provider = provider.name(),
                        kind = kind.label(),
                        raw,
                        "risk score outside 0-40; clamped"
                    );
                }
                info!(
                    provider = provider.name(),
                    kind = kind.label(),
                    points,
                    operator = %evidence.operator_name,
                    "risk assessed"
                );
                RiskAssessmentResult {
                    points,
                    reasoning: content.trim().to_string(),
                    provenance: RiskProvenance::Provider(provider.name().to_string()),
                }
            }
            Err(err) => {
                warn!(
                    provider = provider.name(),
                    kind = kind.label(),
                    error = %err,
                    "risk assessment degraded to zero points"
                );
                RiskAssessmentResult::failed(kind, &err)
            }
        }
    }

    /// Free-text commentary from the configured provider. `None` when no provider is set,
    /// the call fails or times out, or the answer is blank.
    pub async fn narrate(&self, subject: &str, prompt: &str) -> Option<String> {
        let provider = self.provider.as_deref()?;
        let outcome = match tokio::time::timeout(
            self.timeout,
            provider.complete(NARRATIVE_SYSTEM_PROMPT, prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(err) => {
                warn!(provider = provider.name(), subject, error = %err, "narrative skipped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedProvider {
        reply: Result<String, ()>,
        delay: Option<Duration>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RiskProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
            assert!(system == SYSTEM_PROMPT || system == NARRATIVE_SYSTEM_PROMPT);
            self.prompts
                .lock()
                .expect("prompt log poisoned")
                .push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply
                .clone()
                .map_err(|_| ProviderError::Transport("connection reset".to_string()))
        }
    }

    fn adapter(provider: CannedProvider, timeout: Duration) -> RiskAssessmentAdapter {
        RiskAssessmentAdapter::new(Some(Arc::new(provider)), timeout)
    }

    fn evidence() -> RiskEvidence {
        RiskEvidence {
            operator_name: "Acme Aviation".to_string(),
            ..RiskEvidence::default()
        }
    }

    #[tokio::test]
    async fn missing_provider_yields_documented_default() {
        let result = RiskAssessmentAdapter::unconfigured()
            .assess(RiskKind::Financial, &evidence())
            .await;
        assert_eq!(result.points, 0);
        assert_eq!(result.provenance, RiskProvenance::NoClient);
        assert!(result.reasoning.contains("no client configured"));
    }

    #[tokio::test]
    async fn provider_score_is_clamped() {
        let adapter = adapter(
            CannedProvider::replying("Score: 85\nSevere exposure."),
            Duration::from_secs(5),
        );
        let result = adapter.assess(RiskKind::Legal, &evidence()).await;
        assert_eq!(result.points, 40);
        assert_eq!(result.provenance, RiskProvenance::Provider("canned".to_string()));
        assert!(result.reasoning.contains("Severe exposure."));
    }

    #[tokio::test]
    async fn malformed_output_becomes_zero_with_reason() {
        let adapter = adapter(
            CannedProvider::replying("I cannot judge this operator."),
            Duration::from_secs(5),
        );
        let result = adapter.assess(RiskKind::Financial, &evidence()).await;
        assert_eq!(result.points, 0);
        assert_eq!(result.provenance, RiskProvenance::Error);
        assert!(result.reasoning.contains("no usable score"));
    }

    #[tokio::test]
    async fn transport_failure_is_contained() {
        let provider = CannedProvider {
            reply: Err(()),
            ..CannedProvider::replying("")
        };
        let result = adapter(provider, Duration::from_secs(5))
            .assess(RiskKind::Legal, &evidence())
            .await;
        assert_eq!(result.points, 0);
        assert!(result.reasoning.contains("connection reset"));
    }

    #[tokio::test]
    async fn timeout_is_treated_like_provider_error() {
        let provider = CannedProvider {
            delay: Some(Duration::from_secs(5)),
            ..CannedProvider::replying("10")
        };
        let result = adapter(provider, Duration::from_millis(20))
            .assess(RiskKind::Financial, &evidence())
            .await;
        assert_eq!(result.points, 0);
        assert_eq!(result.provenance, RiskProvenance::Error);
        assert!(result.reasoning.contains("did not answer"));
    }

    #[test]
    fn provenance_serializes_as_tag_string() {
        let json = serde_json::to_string(&RiskAssessmentResult::no_client(RiskKind::Legal))
            .expect("serialize");
        assert!(json.contains("\"provenance\":\"no-client\""));
    }

    #[tokio::test]
    async fn narration_needs_a_provider_and_a_reply() {
        let unconfigured = RiskAssessmentAdapter::unconfigured();
        assert_eq!(unconfigured.narrate("fleet", "Explain.").await, None);

        let adapter = adapter(
            CannedProvider::replying("  Steady operator with a clean record.\n"),
            Duration::from_secs(5),
        );
        assert_eq!(
            adapter.narrate("fleet", "Explain.").await.as_deref(),
            Some("Steady operator with a clean record.")
        );

        let silent = RiskAssessmentAdapter::new(
            Some(Arc::new(CannedProvider::replying("   "))),
            Duration::from_secs(5),
        );
        assert_eq!(silent.narrate("tail", "Explain.").await, None);
    }
}
