use serde::de::DeserializeOwned;

use crate::StepwiseError;

pub type Value = serde_json::Value;

/// Typed view of a template variable, e.g. a message history.
pub trait TryFromValue: Sized {
    fn try_from_value(value: Value) -> Result<Self, StepwiseError>;
}

impl<T> TryFromValue for T
where
    T: DeserializeOwned,
{
    fn try_from_value(value: Value) -> Result<Self, StepwiseError> {
        Ok(serde_json::from_value(value)?)
    }
}
