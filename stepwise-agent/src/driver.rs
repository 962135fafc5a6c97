use std::collections::HashMap;
use std::fmt;

use stepwise_core::{is_retryable, LlmRequest, LlmResponse, Message, Role, Runnable, Value};
use stepwise_prompt::{continuation_template, PromptTemplate};

use crate::{
    extract_step_record, DriverError, DriverEvent, DriverState, FailureKind, FixedDelayPolicy,
    Phase, PolicyDecision, RetryPolicy, StepRecord, StepSequence,
};

type Observer = Box<dyn Fn(&DriverEvent) + Send + Sync>;

/// Everything a finished run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverOutcome {
    /// One record per expected step, in step order.
    pub records: Vec<StepRecord>,
    /// The full conversation, starting with the caller's initial turns.
    pub turns: Vec<Message>,
    /// Step-level events only. Per-attempt events (`ResponseReceived`,
    /// `RequestFailed`, `ParseFailed`) go to the observer and are not kept.
    pub events: Vec<DriverEvent>,
    /// Completion requests issued, retries included.
    pub requests: usize,
}

/// Walks a model through a fixed sequence of steps, one JSON record per turn.
///
/// Each iteration sends the whole conversation so far, parses the reply into
/// a [`StepRecord`], appends the reply plus a continuation prompt naming the
/// next step, and moves on. Failed requests and unparseable replies are
/// retried according to the configured [`RetryPolicy`].
pub struct StepDriver<L> {
    llm: L,
    model: String,
    policy: Box<dyn RetryPolicy>,
    continuation: PromptTemplate,
    observer: Option<Observer>,
}

impl<L> fmt::Debug for StepDriver<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDriver")
            .field("model", &self.model)
            .field("continuation", &self.continuation.template())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<L> StepDriver<L>
where
    L: Runnable<LlmRequest, LlmResponse> + Send + Sync,
{
    pub fn new(llm: L, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            policy: Box::new(FixedDelayPolicy::default()),
            continuation: continuation_template(),
            observer: None,
        }
    }

    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: RetryPolicy + 'static,
    {
        self.policy = Box::new(policy);
        self
    }

    /// Replaces the user turn sent between steps. The template receives the
    /// next label as `step`.
    pub fn with_continuation_template(mut self, template: PromptTemplate) -> Self {
        self.continuation = template;
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&DriverEvent) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn run(
        &self,
        steps: &StepSequence,
        initial_turns: Vec<Message>,
    ) -> Result<DriverOutcome, DriverError> {
        if steps.is_empty() {
            return Err(DriverError::EmptySteps);
        }
        if !initial_turns
            .iter()
            .any(|turn| matches!(turn.role, Role::System | Role::User))
        {
            return Err(DriverError::MissingTask);
        }

        let mut state = DriverState::new(initial_turns);
        let mut records = Vec::with_capacity(steps.len());
        let mut events = Vec::new();
        let mut requests = 0usize;
        let mut attempt = 0u32;
        let mut phase = Phase::Requesting;

        tracing::info!(cursor = 0, step = %&steps[0], "step started");
        self.emit(
            &mut events,
            DriverEvent::StepStarted {
                cursor: 0,
                expected: steps[0].to_string(),
            },
        );

        loop {
            let cursor = state.cursor();
            let expected = match (&phase, steps.get(cursor)) {
                (Phase::Done, _) | (_, None) => break,
                (_, Some(expected)) => expected,
            };

            phase = match phase {
                Phase::Requesting => {
                    attempt = attempt.saturating_add(1);
                    requests = requests.saturating_add(1);
                    let request = LlmRequest {
                        model: self.model.clone(),
                        messages: state.turns().to_vec(),
                    };

                    match self.llm.invoke(request).await {
                        Ok(response) => {
                            let raw = response.content.trim().to_string();
                            tracing::debug!(cursor, attempt, raw = %raw, "received completion");
                            self.notify(&DriverEvent::ResponseReceived {
                                cursor,
                                attempt,
                                raw: raw.clone(),
                            });
                            Phase::Parsing { raw }
                        }
                        Err(err) => {
                            let error = err.to_string();
                            tracing::warn!(
                                cursor,
                                attempt,
                                retryable = is_retryable(&err),
                                error = %error,
                                "completion request failed"
                            );
                            self.notify(&DriverEvent::RequestFailed {
                                cursor,
                                attempt,
                                error: error.clone(),
                            });
                            self.back_off(FailureKind::Transport, expected, attempt, error)
                                .await?;
                            Phase::Requesting
                        }
                    }
                }
                Phase::Parsing { raw } => match extract_step_record(&raw) {
                    Ok(record) => Phase::Advancing { raw, record },
                    Err(err) => {
                        let reason = match err {
                            DriverError::Parse { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        tracing::warn!(cursor, attempt, reason = %reason, "reply held no step record");
                        self.notify(&DriverEvent::ParseFailed {
                            cursor,
                            attempt,
                            reason: reason.clone(),
                        });
                        self.back_off(FailureKind::Parse, expected, attempt, reason)
                            .await?;
                        Phase::Requesting
                    }
                },
                Phase::Advancing { raw, record } => {
                    let next = steps.get(cursor + 1);
                    if record.step == expected {
                        let continuation = match next {
                            Some(label) => Some(self.render_continuation(label)?),
                            None => None,
                        };
                        tracing::info!(
                            cursor,
                            step = %record.step,
                            content = %record.content,
                            "step completed"
                        );
                        state.advance(raw, continuation);
                    } else {
                        tracing::warn!(
                            cursor,
                            expected = %expected,
                            got = %record.step,
                            "model answered with a different step"
                        );
                        self.emit(
                            &mut events,
                            DriverEvent::StepMismatch {
                                cursor,
                                expected: expected.to_string(),
                                got: record.step.clone(),
                            },
                        );
                        state.advance(raw, None);
                    }

                    self.emit(
                        &mut events,
                        DriverEvent::StepAdvanced {
                            cursor,
                            record: record.clone(),
                        },
                    );
                    records.push(record);
                    attempt = 0;

                    match next {
                        Some(label) => {
                            tracing::info!(cursor = cursor + 1, step = %label, "step started");
                            self.emit(
                                &mut events,
                                DriverEvent::StepStarted {
                                    cursor: cursor + 1,
                                    expected: label.to_string(),
                                },
                            );
                            Phase::Requesting
                        }
                        None => {
                            self.emit(&mut events, DriverEvent::Completed { cursor });
                            Phase::Done
                        }
                    }
                }
                Phase::Done => break,
            };
        }

        Ok(DriverOutcome {
            records,
            turns: state.into_turns(),
            events,
            requests,
        })
    }

    fn render_continuation(&self, next: &str) -> Result<String, DriverError> {
        let mut vars = HashMap::new();
        vars.insert("step".to_string(), Value::from(next));
        Ok(self.continuation.render(&vars)?)
    }

    async fn back_off(
        &self,
        kind: FailureKind,
        step: &str,
        attempt: u32,
        last_error: String,
    ) -> Result<(), DriverError> {
        match self.policy.on_failure(kind, attempt) {
            PolicyDecision::Retry { delay } => {
                if !delay.is_zero() {
                    tracing::debug!(?delay, attempt, "backing off before retry");
                    tokio::time::sleep(delay).await;
                }
                Ok(())
            }
            PolicyDecision::Fail => Err(DriverError::RetriesExhausted {
                step: step.to_string(),
                attempts: attempt,
                last_error,
            }),
        }
    }

    fn notify(&self, event: &DriverEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    fn emit(&self, events: &mut Vec<DriverEvent>, event: DriverEvent) {
        self.notify(&event);
        events.push(event);
    }
}
