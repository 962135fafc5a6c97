use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepwiseError {
    /// The completion endpoint was unreachable or answered with an error.
    #[error("completion request failed: {0}")]
    LlmProvider(String),
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("value does not have the expected shape: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Whether a failed call is worth repeating unchanged.
pub fn is_retryable(error: &StepwiseError) -> bool {
    matches!(
        error,
        StepwiseError::LlmProvider(_) | StepwiseError::Timeout(_)
    )
}

/// Failure of an [`Embedding`](crate::Embedding) call, independent of provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("embedding endpoint is rate limiting{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },
    #[error("embedding request timed out after {0:?}")]
    Timeout(Duration),
    #[error("embedding request could not be sent: {0}")]
    Transport(String),
    #[error("unexpected embedding response: {0}")]
    InvalidResponse(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(", retry after {delay:?}"),
        None => String::new(),
    }
}
