use super::{ProviderError, RiskProvider};
use crate::config::{RiskConfig, RiskProviderKind};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const TEMPERATURE: f32 = 0.3;
const USER_AGENT: &str = concat!("fleet-trust/", env!("CARGO_PKG_VERSION"));

/// Builds the provider selected in configuration.
pub fn build_provider(config: &RiskConfig) -> Result<Arc<dyn RiskProvider>, ProviderError> {
    let api_key = match (config.provider, config.api_key.as_deref()) {
        (RiskProviderKind::None, _) | (_, None) => return Err(ProviderError::NotConfigured),
        (_, Some(key)) => key.to_string(),
    };
    let client = http_client(config.timeout)?;

    let provider: Arc<dyn RiskProvider> = match config.provider {
        RiskProviderKind::OpenAi => Arc::new(ChatCompletionsProvider::new(
            client,
            "openai",
            OPENAI_BASE_URL,
            api_key,
            config.model.clone().unwrap_or_else(|| "gpt-4".to_string()),
        )),
        RiskProviderKind::OpenRouter => Arc::new(ChatCompletionsProvider::new(
            client,
            "openrouter",
            OPENROUTER_BASE_URL,
            api_key,
            config
                .model
                .clone()
                .unwrap_or_else(|| "anthropic/claude-3.5-sonnet".to_string()),
        )),
        RiskProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            client,
            api_key,
            config
                .model
                .clone()
                .unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_string()),
        )),
        RiskProviderKind::None => return Err(ProviderError::NotConfigured),
    };

    Ok(provider)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::Transport(err.to_string()))
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| ProviderError::Malformed(err.to_string()))
}

/// OpenAI-compatible `/chat/completions` endpoint (OpenAI, OpenRouter).
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    name: &'static str,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsProvider {
    pub fn new(
        client: reqwest::Client,
        name: &'static str,
        base_url: impl Into<String>,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            client,
            name,
            base_url: base_url.into(),
            api_key,
            model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl RiskProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "max_tokens": 500,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        tracing::debug!(provider = self.name, model = %self.model, "requesting risk completion");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let completion: ChatCompletion = read_json(response).await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Malformed("completion had no choices".to_string()))
    }
}

/// Anthropic messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicMessage {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl RiskProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 1024,
            "temperature": TEMPERATURE,
            "system": system,
            "messages": [{ "role": "user", "content": prompt }],
        });

        tracing::debug!(model = %self.model, "requesting anthropic risk completion");
        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let message: AnthropicMessage = read_json(response).await?;
        message
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| ProviderError::Malformed("message had no text block".to_string()))
    }
}
