use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use stepwise_core::StepwiseError;

use crate::OpenAiCompatibleClient;

/// Connection settings for an OpenAI-compatible endpoint, usually read from
/// the process environment at startup.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    pub const API_KEY_VAR: &'static str = "OPENAI_API_KEY";
    pub const BASE_URL_VAR: &'static str = "OPENAI_BASE_URL";
    pub const MODEL_VAR: &'static str = "OPENAI_MODEL";

    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(api_key: impl Into<String>) -> Result<Self, StepwiseError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StepwiseError::InvalidConfig(format!(
                "{} must not be empty",
                Self::API_KEY_VAR
            )));
        }
        Ok(Self {
            api_key: SecretString::new(api_key),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Reads `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self, StepwiseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, StepwiseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(Self::API_KEY_VAR).ok_or_else(|| {
            StepwiseError::InvalidConfig(format!("{} is not set", Self::API_KEY_VAR))
        })?;
        let mut config = Self::new(api_key)?;

        if let Some(base_url) = non_blank(lookup(Self::BASE_URL_VAR)) {
            config.base_url = base_url;
        }
        if let Some(model) = non_blank(lookup(Self::MODEL_VAR)) {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn into_client(self) -> Result<OpenAiCompatibleClient, StepwiseError> {
        OpenAiCompatibleClient::builder()
            .base_url(&self.base_url)?
            .api_key(self.api_key.expose_secret().clone())
            .default_model(self.model)
            .timeout(self.timeout)
            .build()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
