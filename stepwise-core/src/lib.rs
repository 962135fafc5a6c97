mod embedding;
mod error;
mod llm;
mod runnable;
mod value;

pub use embedding::{cosine_similarity, Embedding};
pub use error::{is_retryable, EmbeddingError, StepwiseError};
pub use llm::{LlmRequest, LlmResponse, Message, Role};
pub use runnable::Runnable;
pub use value::{TryFromValue, Value};
