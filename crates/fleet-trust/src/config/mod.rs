use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::identity::MatchConfig;

const DEFAULT_INCIDENT_API_URL: &str = "https://data.ntsb.gov/carol-main-public/api/Query/Main";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub matching: MatchConfig,
    pub risk: RiskConfig,
    pub verification: VerificationConfig,
    pub snapshots: SnapshotConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = MatchConfig::default();
        let matching = MatchConfig {
            threshold: unit_interval("MATCH_THRESHOLD", defaults.threshold)?,
            edit_weight: unit_interval("MATCH_EDIT_WEIGHT", defaults.edit_weight)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching,
            risk: RiskConfig::from_env()?,
            verification: VerificationConfig::from_env()?,
            snapshots: SnapshotConfig {
                directory_csv: optional_var("DIRECTORY_CSV").map(PathBuf::from),
                registry_csv: optional_var("REGISTRY_CSV").map(PathBuf::from),
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which language-model backend answers risk assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskProviderKind {
    None,
    OpenRouter,
    OpenAi,
    Anthropic,
}

impl FromStr for RiskProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "openrouter" => Ok(Self::OpenRouter),
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(ConfigError::UnknownRiskProvider(other.to_string())),
        }
    }
}

impl RiskProviderKind {
    pub fn label(self) -> &'static str {
        match self {
            RiskProviderKind::None => "none",
            RiskProviderKind::OpenRouter => "openrouter",
            RiskProviderKind::OpenAi => "openai",
            RiskProviderKind::Anthropic => "anthropic",
        }
    }

    fn api_key_var(self) -> Option<&'static str> {
        match self {
            RiskProviderKind::None => None,
            RiskProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
            RiskProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            RiskProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }
}

/// Risk-assessment provider selection and call budget.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub provider: RiskProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
}

impl RiskConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let provider = match optional_var("RISK_PROVIDER") {
            Some(value) => value.parse()?,
            None => RiskProviderKind::None,
        };
        let api_key = provider.api_key_var().and_then(optional_var);

        Ok(Self {
            provider,
            api_key,
            model: optional_var("RISK_MODEL"),
            timeout: Duration::from_secs(parse_var("RISK_TIMEOUT_SECS", 30u64)?),
        })
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            provider: RiskProviderKind::None,
            api_key: None,
            model: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Endpoints and time budgets for the remote evidence lookups.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub incident_api_url: String,
    /// Bounds the whole incident step, retries and backoff included.
    pub incident_timeout: Duration,
    /// Bounds a single incident query attempt.
    pub incident_attempt_timeout: Duration,
    pub incident_max_retries: u32,
    pub filing_session_url: Option<String>,
    /// Bounds one jurisdiction search.
    pub filing_timeout: Duration,
    /// Bounds the incident and filing steps together.
    pub verification_timeout: Duration,
}

impl VerificationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            incident_api_url: optional_var("INCIDENT_API_URL")
                .unwrap_or_else(|| DEFAULT_INCIDENT_API_URL.to_string()),
            incident_timeout: Duration::from_secs(parse_var("INCIDENT_TIMEOUT_SECS", 30u64)?),
            incident_attempt_timeout: Duration::from_secs(parse_var(
                "INCIDENT_ATTEMPT_TIMEOUT_SECS",
                8u64,
            )?),
            incident_max_retries: parse_var("INCIDENT_MAX_RETRIES", 2u32)?,
            filing_session_url: optional_var("FILING_SESSION_URL"),
            filing_timeout: Duration::from_secs(parse_var("FILING_TIMEOUT_SECS", 180u64)?),
            verification_timeout: Duration::from_secs(parse_var(
                "VERIFICATION_TIMEOUT_SECS",
                240u64,
            )?),
        })
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            incident_api_url: DEFAULT_INCIDENT_API_URL.to_string(),
            incident_timeout: Duration::from_secs(30),
            incident_attempt_timeout: Duration::from_secs(8),
            incident_max_retries: 2,
            filing_session_url: None,
            filing_timeout: Duration::from_secs(180),
            verification_timeout: Duration::from_secs(240),
        }
    }
}

/// Static snapshot files loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct SnapshotConfig {
    pub directory_csv: Option<PathBuf>,
    pub registry_csv: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str, value: String },
    OutOfRange { var: &'static str, value: f64 },
    UnknownRiskProvider(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be numeric (found '{value}')")
            }
            ConfigError::OutOfRange { var, value } => {
                write!(f, "{var} must be within [0, 1] (found {value})")
            }
            ConfigError::UnknownRiskProvider(value) => write!(
                f,
                "RISK_PROVIDER '{value}' is not one of none, openrouter, openai, anthropic"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
            var: name,
            value: raw,
        }),
        None => Ok(default),
    }
}

fn unit_interval(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let value = parse_var(name, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange { var: name, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "MATCH_THRESHOLD",
            "MATCH_EDIT_WEIGHT",
            "RISK_PROVIDER",
            "RISK_MODEL",
            "RISK_TIMEOUT_SECS",
            "OPENROUTER_API_KEY",
            "OPENAI_API_KEY",
            "ANTHROPIC_API_KEY",
            "INCIDENT_API_URL",
            "INCIDENT_TIMEOUT_SECS",
            "INCIDENT_ATTEMPT_TIMEOUT_SECS",
            "INCIDENT_MAX_RETRIES",
            "FILING_SESSION_URL",
            "FILING_TIMEOUT_SECS",
            "VERIFICATION_TIMEOUT_SECS",
            "DIRECTORY_CSV",
            "REGISTRY_CSV",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.matching, MatchConfig::default());
        assert_eq!(config.risk.provider, RiskProviderKind::None);
        assert_eq!(config.risk.timeout, Duration::from_secs(30));
        assert_eq!(config.verification.filing_timeout, Duration::from_secs(180));
        assert_eq!(config.verification.incident_max_retries, 2);
        assert!(config.verification.filing_session_url.is_none());
    }

    #[test]
    fn incident_attempts_fit_inside_step_budget() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let verification = AppConfig::load().expect("config loads").verification;
        let attempts = verification.incident_max_retries + 1;
        // Backoff sleeps 1s then 2s between the three default attempts.
        let worst_case = verification.incident_attempt_timeout * attempts + Duration::from_secs(3);
        assert!(worst_case <= verification.incident_timeout);
        assert_eq!(verification.verification_timeout, Duration::from_secs(240));

        env::set_var("VERIFICATION_TIMEOUT_SECS", "90");
        env::set_var("INCIDENT_ATTEMPT_TIMEOUT_SECS", "5");
        let verification = AppConfig::load().expect("config loads").verification;
        assert_eq!(verification.verification_timeout, Duration::from_secs(90));
        assert_eq!(verification.incident_attempt_timeout, Duration::from_secs(5));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn risk_provider_picks_matching_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RISK_PROVIDER", "Anthropic");
        env::set_var("ANTHROPIC_API_KEY", "sk-test");
        env::set_var("OPENAI_API_KEY", "sk-other");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.risk.provider, RiskProviderKind::Anthropic);
        assert_eq!(config.risk.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn rejects_unknown_provider_and_out_of_range_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RISK_PROVIDER", "oracle");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::UnknownRiskProvider(_))
        ));

        reset_env();
        env::set_var("MATCH_THRESHOLD", "1.5");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::OutOfRange {
                var: "MATCH_THRESHOLD",
                ..
            })
        ));

        reset_env();
        env::set_var("FILING_TIMEOUT_SECS", "soon");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
