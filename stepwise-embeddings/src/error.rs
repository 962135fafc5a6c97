use std::time::Duration;

use reqwest::StatusCode;
use stepwise_core::EmbeddingError;
use thiserror::Error;

/// What went wrong talking to `/v1/embeddings`, before it is reduced to the
/// provider-neutral [`EmbeddingError`].
#[derive(Debug, Error)]
pub enum EmbeddingProviderError {
    #[error("could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("expected embedding dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("malformed body: {0}")]
    MalformedBody(String),
}

impl EmbeddingProviderError {
    /// Builds the error for a non-2xx reply, preferring the OpenAI error
    /// message over the raw body.
    pub fn from_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Self::RateLimited { retry_after };
        }

        #[derive(serde::Deserialize)]
        struct Envelope {
            error: Detail,
        }
        #[derive(serde::Deserialize)]
        struct Detail {
            message: String,
        }

        let message = serde_json::from_str::<Envelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Self::Status { status, message }
    }
}

impl From<EmbeddingProviderError> for EmbeddingError {
    fn from(error: EmbeddingProviderError) -> Self {
        match error {
            EmbeddingProviderError::Transport { .. } => EmbeddingError::Transport(error.to_string()),
            EmbeddingProviderError::Timeout(after) => EmbeddingError::Timeout(after),
            EmbeddingProviderError::Status { status, message } => EmbeddingError::Status {
                status: status.as_u16(),
                message,
            },
            EmbeddingProviderError::RateLimited { retry_after } => {
                EmbeddingError::RateLimited { retry_after }
            }
            EmbeddingProviderError::CountMismatch { .. }
            | EmbeddingProviderError::DimensionMismatch { .. }
            | EmbeddingProviderError::MalformedBody(_) => {
                EmbeddingError::InvalidResponse(error.to_string())
            }
        }
    }
}
