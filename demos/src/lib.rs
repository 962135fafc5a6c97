//! Shared setup for the demo binaries.

use stepwise_core::{LlmRequest, Message, Runnable};
use stepwise_llm::OpenAiClient;
use tracing_subscriber::EnvFilter;

/// Loads `.env` if present and installs a `RUST_LOG`-driven subscriber.
pub fn init() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Sends `messages` in one request and returns the reply text.
pub async fn complete(client: &OpenAiClient, messages: Vec<Message>) -> anyhow::Result<String> {
    let response = client
        .invoke(LlmRequest {
            model: client.model().to_string(),
            messages,
        })
        .await?;
    Ok(response.content)
}
