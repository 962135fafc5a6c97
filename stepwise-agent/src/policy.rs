use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The completion request itself failed.
    Transport,
    /// The reply held no usable step record.
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Retry { delay: Duration },
    Fail,
}

impl PolicyDecision {
    pub fn retry_now() -> Self {
        Self::Retry {
            delay: Duration::ZERO,
        }
    }
}

/// Decides what happens after a failed attempt at the current step.
///
/// `attempt` is the number of requests already issued for the step, so the
/// first failure is reported with `attempt == 1`.
pub trait RetryPolicy: Send + Sync {
    fn on_failure(&self, kind: FailureKind, attempt: u32) -> PolicyDecision;
}

/// Retries transport failures after a fixed delay and parse failures
/// immediately. Unbounded unless [`FixedDelayPolicy::with_max_attempts`] is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDelayPolicy {
    transport_delay: Duration,
    parse_delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelayPolicy {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn new(transport_delay: Duration) -> Self {
        Self {
            transport_delay,
            parse_delay: Duration::ZERO,
            max_attempts: None,
        }
    }

    pub fn with_parse_delay(mut self, delay: Duration) -> Self {
        self.parse_delay = delay;
        self
    }

    /// Caps the requests issued per step. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn transport_delay(&self) -> Duration {
        self.transport_delay
    }
}

impl Default for FixedDelayPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl RetryPolicy for FixedDelayPolicy {
    fn on_failure(&self, kind: FailureKind, attempt: u32) -> PolicyDecision {
        if matches!(self.max_attempts, Some(max) if attempt >= max) {
            return PolicyDecision::Fail;
        }

        let delay = match kind {
            FailureKind::Transport => self.transport_delay,
            FailureKind::Parse => self.parse_delay,
        };
        PolicyDecision::Retry { delay }
    }
}
