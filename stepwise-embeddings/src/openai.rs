use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use stepwise_core::{Embedding, EmbeddingError};

use crate::EmbeddingProviderError;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Embeddings from `POST {base_url}/v1/embeddings`.
#[derive(Clone)]
pub struct OpenAiEmbedding {
    base_url: String,
    api_key: SecretString,
    model: String,
    dimension: usize,
    timeout: Duration,
    http: Client,
}

impl fmt::Debug for OpenAiEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedding")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl OpenAiEmbedding {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: SecretString::new(api_key.into()),
            model: model.into(),
            dimension,
            timeout: DEFAULT_TIMEOUT,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'))
    }

    async fn request(
        &self,
        input: EmbeddingInput<'_>,
    ) -> Result<Vec<EmbeddingData>, EmbeddingProviderError> {
        let url = self.embeddings_url();
        let request = EmbeddingRequest {
            model: &self.model,
            input,
            encoding_format: "float",
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    EmbeddingProviderError::Timeout(self.timeout)
                } else {
                    EmbeddingProviderError::Transport { url, source }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingProviderError::from_status(status, retry_after, &body));
        }

        let mut response = response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|err| EmbeddingProviderError::MalformedBody(err.to_string()))?;
        tracing::debug!(
            model = %response.model,
            count = response.data.len(),
            "received embeddings"
        );

        response.data.sort_by_key(|item| item.index);
        if let Some(item) = response
            .data
            .iter()
            .find(|item| item.embedding.len() != self.dimension)
        {
            return Err(EmbeddingProviderError::DimensionMismatch {
                expected: self.dimension,
                actual: item.embedding.len(),
            });
        }

        Ok(response.data)
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[async_trait]
impl Embedding for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request(EmbeddingInput::Single(text))
            .await?
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| {
                EmbeddingProviderError::CountMismatch {
                    expected: 1,
                    actual: 0,
                }
                .into()
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let data = self.request(EmbeddingInput::Batch(texts)).await?;
        if data.len() != texts.len() {
            return Err(EmbeddingProviderError::CountMismatch {
                expected: texts.len(),
                actual: data.len(),
            }
            .into());
        }

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
