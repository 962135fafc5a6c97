use async_trait::async_trait;

use crate::StepwiseError;

/// A single asynchronous unit of work, such as one completion round trip.
#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, StepwiseError>;
}

#[async_trait]
impl<Input, Output, R> Runnable<Input, Output> for &R
where
    Input: Send + 'static,
    Output: Send + 'static,
    R: Runnable<Input, Output> + Send + Sync + ?Sized,
{
    async fn invoke(&self, input: Input) -> Result<Output, StepwiseError> {
        (**self).invoke(input).await
    }
}
