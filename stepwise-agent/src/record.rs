use serde::{Deserialize, Serialize};

use crate::DriverError;

/// One `{step, content}` object pulled out of an assistant reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub content: String,
}

/// Where in the reply the record was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionSource {
    WholeText,
    /// Zero-based index among the non-empty lines of the trimmed reply.
    Line(usize),
}

pub fn extract_step_record(text: &str) -> Result<StepRecord, DriverError> {
    extract_step_record_with_source(text).map(|(record, _)| record)
}

/// Parses the trimmed text as a single object first. Failing that, takes the
/// first non-empty line that is itself a `{...}` object and parses.
pub fn extract_step_record_with_source(
    text: &str,
) -> Result<(StepRecord, ExtractionSource), DriverError> {
    let trimmed = text.trim();
    let whole_error = match serde_json::from_str::<StepRecord>(trimmed) {
        Ok(record) => return Ok((record, ExtractionSource::WholeText)),
        Err(err) => err,
    };

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .filter(|(_, line)| line.starts_with('{') && line.ends_with('}'))
        .find_map(|(index, line)| {
            serde_json::from_str::<StepRecord>(line)
                .ok()
                .map(|record| (record, ExtractionSource::Line(index)))
        })
        .ok_or_else(|| DriverError::Parse {
            output: trimmed.to_string(),
            reason: whole_error.to_string(),
        })
}
