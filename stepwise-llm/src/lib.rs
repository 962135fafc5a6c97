mod config;

// OpenAI-compatible client (always available)
pub mod openai_compatible;

// Provider-specific clients (feature-gated)
pub mod providers;

pub use config::OpenAiConfig;
pub use stepwise_core::{LlmRequest, LlmResponse, Message, Role};

pub use openai_compatible::{
    ChatCompletionRequest, ChatCompletionResponse, OpenAiCompatibleBuilder, OpenAiCompatibleClient,
};

#[cfg(feature = "openai")]
pub use providers::openai::OpenAiClient;
