//! Generic OpenAI-compatible LLM client
//!
//! Supports any provider using OpenAI's chat completions format (OpenAI,
//! DeepSeek, Together, local gateways, etc.)

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use stepwise_core::{LlmRequest, LlmResponse, Message, Runnable, StepwiseError};
use url::Url;

const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

/// Request body for chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

/// Non-streaming response from chat completions
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiError {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    default_model: String,
    timeout: Duration,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Default, Clone)]
pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    default_model: Option<String>,
    timeout: Option<Duration>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl fmt::Debug for OpenAiCompatibleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("OpenAiCompatibleBuilder")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("api_key", &api_key)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatibleBuilder {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the API, without the `/v1/...` suffix.
    pub fn base_url(mut self, value: impl AsRef<str>) -> Result<Self, StepwiseError> {
        let raw = value.as_ref().trim();
        let mut url = Url::parse(raw)
            .map_err(|err| StepwiseError::InvalidConfig(format!("invalid base url '{raw}': {err}")))?;
        if url.cannot_be_a_base() {
            return Err(StepwiseError::InvalidConfig(format!(
                "base url '{raw}' cannot be a base"
            )));
        }
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.api_key = if value.trim().is_empty() {
            None
        } else {
            Some(SecretString::new(value))
        };
        self
    }

    pub fn default_model(mut self, value: impl Into<String>) -> Self {
        self.default_model = Some(value.into());
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    pub fn temperature(mut self, value: f32) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn max_tokens(mut self, value: u32) -> Self {
        self.max_tokens = Some(value);
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, StepwiseError> {
        let base_url = self
            .base_url
            .ok_or_else(|| StepwiseError::InvalidConfig("base url is required".to_string()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| StepwiseError::InvalidConfig("api key is required".to_string()))?;
        let default_model = self
            .default_model
            .filter(|model| !model.trim().is_empty())
            .ok_or_else(|| StepwiseError::InvalidConfig("default model is required".to_string()))?;
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(StepwiseError::InvalidConfig(format!(
                    "temperature {temperature} out of range (0.0..=2.0)"
                )));
            }
        }

        let timeout = self.timeout.unwrap_or(Self::DEFAULT_TIMEOUT);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StepwiseError::InvalidConfig(err.to_string()))?;

        Ok(OpenAiCompatibleClient {
            http,
            base_url,
            api_key,
            default_model,
            timeout,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::new()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self) -> Result<Url, StepwiseError> {
        self.base_url
            .join(CHAT_COMPLETIONS_PATH)
            .map_err(|err| StepwiseError::InvalidConfig(err.to_string()))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> StepwiseError {
        if err.is_timeout() {
            StepwiseError::Timeout(self.timeout)
        } else {
            StepwiseError::LlmProvider(err.to_string())
        }
    }

    pub async fn create(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, StepwiseError> {
        let url = self.endpoint()?;
        tracing::debug!(
            url = %url,
            model = %request.model,
            turns = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<OpenAiError>(&body) {
                Ok(error) => error.error.message,
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(StepwiseError::LlmProvider(message));
        }

        serde_json::from_str(&body).map_err(|err| {
            StepwiseError::LlmProvider(format!("invalid chat completion body: {err}"))
        })
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for OpenAiCompatibleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        let LlmRequest { model, messages } = input;
        let model = if model.is_empty() {
            self.default_model.clone()
        } else {
            model
        };
        let request = ChatCompletionRequest {
            model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self.create(request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StepwiseError::LlmProvider("no choices returned".to_string()))?
            .message
            .content
            .ok_or_else(|| StepwiseError::LlmProvider("first choice has no content".to_string()))?;

        Ok(LlmResponse { content })
    }
}
