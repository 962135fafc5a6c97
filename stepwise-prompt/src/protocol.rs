//! Prompts for the one-step-per-turn JSON protocol, where the model answers
//! each turn with a single `{"step": ..., "content": ...}` object.

use std::collections::HashMap;

use stepwise_core::{StepwiseError, Value};

use crate::PromptTemplate;

const SYSTEM_TEMPLATE: &str = r#"You are a helpful assistant who works on {{labels}} format.

IMPORTANT: You must respond with ONLY ONE step at a time, not all steps together.

Rules:
- Only respond with ONE JSON object per response
- Wait for the next prompt to continue to the next step
- Only respond with valid JSON format, no additional text
- No extra whitespace or line breaks

Output JSON format (ONE step only):
{"step":"{{alternatives}}", "content":"string"}

Process:
{{process}}"#;

const CONTINUATION_TEMPLATE: &str = "Continue to {{step}} step.";

/// Renders the system turn that establishes the step contract for `labels`.
pub fn step_protocol_system_prompt<S: AsRef<str>>(labels: &[S]) -> Result<String, StepwiseError> {
    let labels: Vec<&str> = labels.iter().map(AsRef::as_ref).collect();
    let process = labels
        .iter()
        .enumerate()
        .map(|(index, label)| format!("{}. Response {} should be {label} step", index + 1, index + 1))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("labels".to_string(), Value::from(human_list(&labels)));
    vars.insert("alternatives".to_string(), Value::from(labels.join(" | ")));
    vars.insert("process".to_string(), Value::from(process));

    PromptTemplate::new(SYSTEM_TEMPLATE.to_string()).render(&vars)
}

/// The template for the synthetic user turn sent between steps. Its one
/// variable is `step`.
pub fn continuation_template() -> PromptTemplate {
    PromptTemplate::new(CONTINUATION_TEMPLATE.to_string())
}

pub fn continuation_prompt(next_step: &str) -> Result<String, StepwiseError> {
    let mut vars = HashMap::new();
    vars.insert("step".to_string(), Value::from(next_step));
    continuation_template().render(&vars)
}

// "A", "A and B", "A, B and C"
fn human_list(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
