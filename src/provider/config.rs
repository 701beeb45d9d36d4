//! Client configuration for the chat-completion provider.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

use super::error::ProviderError;
use super::retry::RetryPolicy;
use crate::utils::settings::get_env_var;

/// Default OpenRouter-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default response token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default total attempts per logical request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default value for the `X-Title` identification header.
pub const DEFAULT_APP_NAME: &str = "flashgen";


/// Immutable configuration for [`ChatClient`](super::client::ChatClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer token sent to the provider.
    pub api_key: String,
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Model used when a request does not override it.
    pub default_model: String,
    /// Temperature used when a request does not override it.
    pub default_temperature: f32,
    /// Token limit used when a request does not override it.
    pub default_max_tokens: u32,
    /// Deadline for a single HTTP attempt.
    pub timeout: Duration,
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Backoff between attempts.
    pub retry: RetryPolicy,
    /// Sent as `X-Title`.
    pub app_name: String,
    /// Sent as `HTTP-Referer` when set.
    pub app_url: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration with default settings for the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            default_max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry: RetryPolicy::default(),
            app_name: DEFAULT_APP_NAME.to_string(),
            app_url: None,
        }
    }

    /// Loads configuration from the environment, falling back to
    /// `$HOME/.flashgen/settings.json`.
    ///
    /// Only `OPENROUTER_API_KEY` is required. A missing key is reported
    /// here rather than on first use.
    pub fn from_env() -> Result<Self> {
        let api_key = get_env_var("OPENROUTER_API_KEY")
            .map_err(|_| ProviderError::Config("OPENROUTER_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);

        if let Ok(base_url) = get_env_var("OPENROUTER_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = get_env_var("OPENROUTER_MODEL") {
            config.default_model = model;
        }
        if let Ok(value) = get_env_var("OPENROUTER_TEMPERATURE") {
            config.default_temperature = value
                .parse()
                .with_context(|| format!("Invalid OPENROUTER_TEMPERATURE: {value}"))?;
        }
        if let Ok(value) = get_env_var("OPENROUTER_MAX_TOKENS") {
            config.default_max_tokens = value
                .parse()
                .with_context(|| format!("Invalid OPENROUTER_MAX_TOKENS: {value}"))?;
        }
        if let Ok(value) = get_env_var("OPENROUTER_TIMEOUT_MS") {
            let millis: u64 = value
                .parse()
                .with_context(|| format!("Invalid OPENROUTER_TIMEOUT_MS: {value}"))?;
            config.timeout = Duration::from_millis(millis);
        }
        if let Ok(app_name) = get_env_var("OPENROUTER_APP_NAME") {
            config.app_name = app_name;
        }
        if let Ok(app_url) = get_env_var("OPENROUTER_APP_URL") {
            config.app_url = Some(app_url);
        }
        if let Ok(value) = get_env_var("OPENROUTER_MAX_RETRIES") {
            config.max_retries = value
                .parse()
                .with_context(|| format!("Invalid OPENROUTER_MAX_RETRIES: {value}"))?;
        }

        Ok(config)
    }

    /// Overrides the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Overrides the per-attempt deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the total attempt count.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the URL sent as `HTTP-Referer`.
    #[must_use]
    pub fn with_app_url(mut self, app_url: impl Into<String>) -> Self {
        self.app_url = Some(app_url.into());
        self
    }

    /// Overrides the backoff policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Checks the invariants the client relies on.
    pub fn validate(&self) -> std::result::Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Config("API key must not be empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ProviderError::Config("Base URL must not be empty".to_string()));
        }
        if self.max_retries == 0 {
            return Err(ProviderError::Config(
                "max_retries must allow at least one attempt".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the API key with everything but the last four characters hidden.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{visible}", "*".repeat(chars.len() - 4))
    }
}

// Keeps the key out of debug logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry", &self.retry)
            .field("app_name", &self.app_name)
            .field("app_url", &self.app_url)
            .finish()
    }
}
