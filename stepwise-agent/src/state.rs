use std::ops::Index;

use stepwise_core::Message;

use crate::{DriverError, StepRecord};

/// The ordered step labels a run must walk through. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepSequence(Vec<String>);

impl StepSequence {
    pub fn new<I, S>(labels: I) -> Result<Self, DriverError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(DriverError::EmptySteps);
        }
        if let Some(index) = labels.iter().position(|label| label.trim().is_empty()) {
            return Err(DriverError::BlankStepLabel { index });
        }
        Ok(Self(labels))
    }

    /// `START`, `THINK`, `OUTPUT`
    pub fn start_think_output() -> Self {
        Self(vec![
            "START".to_string(),
            "THINK".to_string(),
            "OUTPUT".to_string(),
        ])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

impl Index<usize> for StepSequence {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

/// Conversation history plus progress through the step sequence.
///
/// Turns are only ever appended. The cursor only moves forward, one step per
/// call to [`DriverState::advance`].
#[derive(Clone, Debug, PartialEq)]
pub struct DriverState {
    turns: Vec<Message>,
    cursor: usize,
}

impl DriverState {
    pub fn new(initial_turns: Vec<Message>) -> Self {
        Self {
            turns: initial_turns,
            cursor: 0,
        }
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn into_turns(self) -> Vec<Message> {
        self.turns
    }

    pub(crate) fn advance(&mut self, assistant_reply: String, continuation: Option<String>) {
        self.turns.push(Message::assistant(assistant_reply));
        if let Some(prompt) = continuation {
            self.turns.push(Message::user(prompt));
        }
        self.cursor += 1;
    }
}

/// Where the driver loop is within one iteration.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Requesting,
    Parsing { raw: String },
    Advancing { raw: String, record: StepRecord },
    Done,
}
