//! OpenAI LLM client

use crate::openai_compatible::OpenAiCompatibleClient;
use crate::{LlmRequest, LlmResponse, OpenAiConfig};
use stepwise_core::{Runnable, StepwiseError};

/// OpenAI LLM client
#[derive(Clone, Debug)]
pub struct OpenAiClient(OpenAiCompatibleClient);

impl OpenAiClient {
    /// Create a new OpenAI client with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, StepwiseError> {
        Self::from_config(OpenAiConfig::new(api_key)?)
    }

    /// Create a client from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`
    pub fn from_env() -> Result<Self, StepwiseError> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    pub fn from_config(config: OpenAiConfig) -> Result<Self, StepwiseError> {
        Ok(Self(config.into_client()?))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.0.set_default_model(model);
        self
    }

    pub fn model(&self) -> &str {
        self.0.default_model()
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for OpenAiClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        self.0.invoke(input).await
    }
}
