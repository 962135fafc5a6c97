use stepwise_core::StepwiseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("expected step sequence must not be empty")]
    EmptySteps,
    #[error("step label at position {index} is blank")]
    BlankStepLabel { index: usize },
    #[error("initial turns must contain at least one system or user turn")]
    MissingTask,
    #[error("no step record found in response '{output}': {reason}")]
    Parse { output: String, reason: String },
    #[error("gave up on step '{step}' after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        step: String,
        attempts: u32,
        last_error: String,
    },
    #[error("failed to render continuation prompt: {0}")]
    Prompt(#[from] StepwiseError),
}
