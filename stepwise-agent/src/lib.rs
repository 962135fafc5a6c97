mod driver;
mod error;
mod event;
mod policy;
mod record;
mod state;

pub use driver::{DriverOutcome, StepDriver};
pub use error::DriverError;
pub use event::{validate_completed_once, validate_cursor_progression, DriverEvent};
pub use policy::{FailureKind, FixedDelayPolicy, PolicyDecision, RetryPolicy};
pub use record::{extract_step_record, extract_step_record_with_source, ExtractionSource, StepRecord};
pub use state::{DriverState, Phase, StepSequence};
