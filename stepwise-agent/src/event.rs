use crate::StepRecord;

/// Progress notifications emitted by the driver, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverEvent {
    StepStarted {
        cursor: usize,
        expected: String,
    },
    ResponseReceived {
        cursor: usize,
        attempt: u32,
        raw: String,
    },
    RequestFailed {
        cursor: usize,
        attempt: u32,
        error: String,
    },
    ParseFailed {
        cursor: usize,
        attempt: u32,
        reason: String,
    },
    StepMismatch {
        cursor: usize,
        expected: String,
        got: String,
    },
    StepAdvanced {
        cursor: usize,
        record: StepRecord,
    },
    Completed {
        cursor: usize,
    },
}

impl DriverEvent {
    pub fn cursor(&self) -> usize {
        match self {
            DriverEvent::StepStarted { cursor, .. }
            | DriverEvent::ResponseReceived { cursor, .. }
            | DriverEvent::RequestFailed { cursor, .. }
            | DriverEvent::ParseFailed { cursor, .. }
            | DriverEvent::StepMismatch { cursor, .. }
            | DriverEvent::StepAdvanced { cursor, .. }
            | DriverEvent::Completed { cursor } => *cursor,
        }
    }
}

/// Checks that cursors never go backwards and that `StepAdvanced` fires once
/// per cursor value, in order, starting from zero.
pub fn validate_cursor_progression(events: &[DriverEvent]) -> Result<(), String> {
    let mut last_cursor = 0;
    let mut next_advance = 0;

    for (index, event) in events.iter().enumerate() {
        let cursor = event.cursor();
        if cursor < last_cursor {
            return Err(format!(
                "cursor went back from {last_cursor} to {cursor} at index {index}"
            ));
        }
        last_cursor = cursor;

        if let DriverEvent::StepAdvanced { cursor, .. } = event {
            if *cursor != next_advance {
                return Err(format!(
                    "step advanced at cursor {cursor}, expected {next_advance} at index {index}"
                ));
            }
            next_advance += 1;
        }
    }

    Ok(())
}

pub fn validate_completed_once(events: &[DriverEvent]) -> Result<(), String> {
    let completed: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| matches!(event, DriverEvent::Completed { .. }))
        .map(|(index, _)| index)
        .collect();

    match completed.as_slice() {
        [index] if *index + 1 == events.len() => Ok(()),
        [index] => Err(format!("Completed at index {index} is not the last event")),
        [] => Err("no Completed event".to_string()),
        many => Err(format!("Completed emitted {} times", many.len())),
    }
}
