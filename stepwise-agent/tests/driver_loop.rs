use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stepwise_agent::{
    validate_completed_once, validate_cursor_progression, DriverError, DriverEvent,
    FixedDelayPolicy, StepDriver, StepRecord, StepSequence,
};
use stepwise_core::{LlmRequest, LlmResponse, Message, Role, Runnable, StepwiseError};
use stepwise_prompt::PromptTemplate;

#[derive(Default)]
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, StepwiseError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<String, StepwiseError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn ok(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|reply| Ok(reply.to_string())).collect())
    }

    fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Runnable<LlmRequest, LlmResponse> for ScriptedLlm {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        self.requests.lock().unwrap().push(input);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StepwiseError::LlmProvider("script exhausted".to_string())));
        next.map(|content| LlmResponse { content })
    }
}

const START: &str = r#"{"step":"START","content":"Solve 3 + 4 * 10 - 4 * 3 - 4 * 3"}"#;
const THINK: &str = r#"{"step":"THINK","content":"4 * 10 = 40, 4 * 3 = 12, 3 + 40 - 12 - 12 = 19"}"#;
const OUTPUT: &str = r#"{"step":"OUTPUT","content":"19"}"#;

fn task_turns() -> Vec<Message> {
    vec![
        Message::system("Answer one step at a time."),
        Message::user("Can you solve 3 + 4 * 10 - 4 * 3 - 4 * 3"),
    ]
}

fn record(step: &str, content: &str) -> StepRecord {
    StepRecord {
        step: step.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn walks_every_step_in_order() {
    let llm = ScriptedLlm::ok(&[START, THINK, OUTPUT]);
    let driver = StepDriver::new(&llm, "gpt-4o-mini");
    let steps = StepSequence::start_think_output();

    let outcome = driver.run(&steps, task_turns()).await.unwrap();

    assert_eq!(
        outcome.records,
        vec![
            record("START", "Solve 3 + 4 * 10 - 4 * 3 - 4 * 3"),
            record("THINK", "4 * 10 = 40, 4 * 3 = 12, 3 + 40 - 12 - 12 = 19"),
            record("OUTPUT", "19"),
        ]
    );
    assert_eq!(outcome.requests, 3);
    // initial + assistant/continuation pairs + final assistant turn
    assert_eq!(outcome.turns.len(), 2 + 2 * (3 - 1) + 1);

    let tail: Vec<(Role, &str)> = outcome.turns[2..]
        .iter()
        .map(|turn| (turn.role, turn.content.as_str()))
        .collect();
    assert_eq!(
        tail,
        vec![
            (Role::Assistant, START),
            (Role::User, "Continue to THINK step."),
            (Role::Assistant, THINK),
            (Role::User, "Continue to OUTPUT step."),
            (Role::Assistant, OUTPUT),
        ]
    );

    validate_cursor_progression(&outcome.events).unwrap();
    validate_completed_once(&outcome.events).unwrap();
}

#[tokio::test]
async fn every_request_carries_the_history_so_far() {
    let llm = ScriptedLlm::ok(&[START, THINK, OUTPUT]);
    let driver = StepDriver::new(&llm, "gpt-4o-mini");

    let outcome = driver
        .run(&StepSequence::start_think_output(), task_turns())
        .await
        .unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    for (index, request) in requests.iter().enumerate() {
        assert_eq!(request.model, "gpt-4o-mini");
        let expected_len = 2 + 2 * index;
        assert_eq!(request.messages, outcome.turns[..expected_len].to_vec());
    }
}

#[tokio::test]
async fn single_step_sequence_sends_no_continuation() {
    let llm = ScriptedLlm::ok(&[OUTPUT]);
    let driver = StepDriver::new(&llm, "m");
    let steps = StepSequence::new(["OUTPUT"]).unwrap();

    let outcome = driver.run(&steps, task_turns()).await.unwrap();

    assert_eq!(outcome.records, vec![record("OUTPUT", "19")]);
    assert_eq!(outcome.turns.len(), 3);
    assert_eq!(outcome.turns[2].role, Role::Assistant);
}

#[tokio::test]
async fn unparseable_replies_are_retried_without_growing_history() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let llm = ScriptedLlm::ok(&[
        START,
        "Let me think about this...",
        "```json\nnot quite\n```",
        THINK,
        OUTPUT,
    ]);
    let driver = StepDriver::new(&llm, "m")
        .with_observer(move |event: &DriverEvent| sink.lock().unwrap().push(event.clone()));

    let outcome = driver
        .run(&StepSequence::start_think_output(), task_turns())
        .await
        .unwrap();

    assert_eq!(outcome.requests, 5);
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.turns.len(), 7);

    let requests = llm.requests();
    // the two failed THINK attempts and the successful one share a prefix
    assert_eq!(requests[1].messages, requests[2].messages);
    assert_eq!(requests[2].messages, requests[3].messages);

    let parse_failures = seen
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, DriverEvent::ParseFailed { cursor: 1, .. }))
        .count();
    assert_eq!(parse_failures, 2);
    assert!(!outcome
        .events
        .iter()
        .any(|event| matches!(event, DriverEvent::ParseFailed { .. })));
    validate_cursor_progression(&outcome.events).unwrap();
}

#[tokio::test(start_paused = true)]
async fn parse_retries_do_not_sleep() {
    let llm = ScriptedLlm::ok(&["nope", "still nope", START]);
    let driver = StepDriver::new(&llm, "m");
    let steps = StepSequence::new(["START"]).unwrap();

    let started = tokio::time::Instant::now();
    let outcome = driver.run(&steps, task_turns()).await.unwrap();

    assert_eq!(outcome.requests, 3);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_waits_then_retries() {
    let llm = ScriptedLlm::new(vec![
        Err(StepwiseError::LlmProvider("connection reset".to_string())),
        Ok(START.to_string()),
    ]);
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    let driver = StepDriver::new(&llm, "m").with_observer(move |event: &DriverEvent| {
        if let DriverEvent::RequestFailed { attempt, error, .. } = event {
            sink.lock().unwrap().push((*attempt, error.clone()));
        }
    });
    let steps = StepSequence::new(["START"]).unwrap();

    let started = tokio::time::Instant::now();
    let outcome = driver.run(&steps, task_turns()).await.unwrap();

    assert_eq!(outcome.requests, 2);
    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 1);
    assert!(failures[0].1.contains("connection reset"));
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(llm.requests()[0].messages, llm.requests()[1].messages);
    assert_eq!(outcome.turns.len(), 3);
    assert_eq!(outcome.turns[2].content, START);
}

#[tokio::test(start_paused = true)]
async fn custom_delay_is_honoured() {
    let llm = ScriptedLlm::new(vec![
        Err(StepwiseError::Timeout(Duration::from_secs(60))),
        Err(StepwiseError::Timeout(Duration::from_secs(60))),
        Ok(START.to_string()),
    ]);
    let driver = StepDriver::new(&llm, "m")
        .with_policy(FixedDelayPolicy::new(Duration::from_millis(250)));

    let started = tokio::time::Instant::now();
    driver
        .run(&StepSequence::new(["START"]).unwrap(), task_turns())
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(1));
}

#[tokio::test]
async fn mismatched_step_is_kept_without_a_continuation() {
    let llm = ScriptedLlm::ok(&[START, OUTPUT, OUTPUT]);
    let driver = StepDriver::new(&llm, "m");

    let outcome = driver
        .run(&StepSequence::start_think_output(), task_turns())
        .await
        .unwrap();

    assert_eq!(
        outcome.records,
        vec![
            record("START", "Solve 3 + 4 * 10 - 4 * 3 - 4 * 3"),
            record("OUTPUT", "19"),
            record("OUTPUT", "19"),
        ]
    );
    let roles: Vec<Role> = outcome.turns.iter().map(|turn| turn.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::Assistant,
        ]
    );
    assert!(outcome.events.contains(&DriverEvent::StepMismatch {
        cursor: 1,
        expected: "THINK".to_string(),
        got: "OUTPUT".to_string(),
    }));
    validate_cursor_progression(&outcome.events).unwrap();
    validate_completed_once(&outcome.events).unwrap();
}

#[tokio::test]
async fn bounded_policy_gives_up() {
    let llm = ScriptedLlm::ok(&[START, "garbage", "more garbage", "still garbage", OUTPUT]);
    let driver =
        StepDriver::new(&llm, "m").with_policy(FixedDelayPolicy::default().with_max_attempts(3));

    let err = driver
        .run(&StepSequence::start_think_output(), task_turns())
        .await
        .unwrap_err();

    match err {
        DriverError::RetriesExhausted {
            step,
            attempts,
            last_error,
        } => {
            assert_eq!(step, "THINK");
            assert_eq!(attempts, 3);
            assert!(!last_error.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(llm.requests().len(), 4);
}

#[tokio::test]
async fn attempt_budget_resets_per_step() {
    let llm = ScriptedLlm::ok(&["x", START, "y", THINK, "z", OUTPUT]);
    let driver =
        StepDriver::new(&llm, "m").with_policy(FixedDelayPolicy::default().with_max_attempts(2));

    let outcome = driver
        .run(&StepSequence::start_think_output(), task_turns())
        .await
        .unwrap();

    assert_eq!(outcome.requests, 6);
    assert_eq!(outcome.records.len(), 3);
}

#[tokio::test]
async fn rejects_turns_without_a_task() {
    let llm = ScriptedLlm::ok(&[START]);
    let driver = StepDriver::new(&llm, "m");

    let err = driver
        .run(
            &StepSequence::start_think_output(),
            vec![Message::assistant("I am ready.")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::MissingTask));

    let err = driver
        .run(&StepSequence::start_think_output(), Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::MissingTask));

    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn custom_continuation_template_is_used() {
    let llm = ScriptedLlm::ok(&[START, THINK]);
    let driver = StepDriver::new(&llm, "m")
        .with_continuation_template(PromptTemplate::new("Now do {{ step }}.".to_string()));

    let outcome = driver
        .run(&StepSequence::new(["START", "THINK"]).unwrap(), task_turns())
        .await
        .unwrap();

    assert_eq!(outcome.turns[3], Message::user("Now do THINK."));
}

#[tokio::test]
async fn observer_sees_attempts_that_the_outcome_drops() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let llm = ScriptedLlm::ok(&[START, "oops", THINK, OUTPUT]);
    let driver = StepDriver::new(&llm, "m")
        .with_observer(move |event: &DriverEvent| sink.lock().unwrap().push(event.clone()));

    let outcome = driver
        .run(&StepSequence::start_think_output(), task_turns())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let step_level: Vec<DriverEvent> = seen
        .iter()
        .filter(|event| {
            !matches!(
                event,
                DriverEvent::ResponseReceived { .. }
                    | DriverEvent::RequestFailed { .. }
                    | DriverEvent::ParseFailed { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(step_level, outcome.events);

    let responses = seen
        .iter()
        .filter(|event| matches!(event, DriverEvent::ResponseReceived { .. }))
        .count();
    assert_eq!(responses, 4);
    assert!(seen.contains(&DriverEvent::ResponseReceived {
        cursor: 1,
        attempt: 1,
        raw: "oops".to_string(),
    }));
    validate_cursor_progression(&seen).unwrap();

    assert!(matches!(
        outcome.events.first(),
        Some(DriverEvent::StepStarted { cursor: 0, .. })
    ));
    assert!(matches!(
        outcome.events.last(),
        Some(DriverEvent::Completed { cursor: 2 })
    ));
}

/// Answers with the same prose `failures` times, then with a START record.
struct StubbornLlm {
    prose: String,
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Runnable<LlmRequest, LlmResponse> for StubbornLlm {
    async fn invoke(&self, _input: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let content = if call < self.failures {
            self.prose.clone()
        } else {
            START.to_string()
        };
        Ok(LlmResponse { content })
    }
}

#[tokio::test]
async fn long_parse_retry_streak_keeps_outcome_small() {
    let llm = StubbornLlm {
        prose: "I would rather explain this in prose. ".repeat(270),
        failures: 5_000,
        calls: AtomicUsize::new(0),
    };
    let driver = StepDriver::new(&llm, "m");

    let outcome = driver
        .run(&StepSequence::new(["START"]).unwrap(), task_turns())
        .await
        .unwrap();

    assert_eq!(outcome.requests, 5_001);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 5_001);
    assert_eq!(outcome.turns.len(), 3);
    assert_eq!(outcome.turns[2].content, START);
    assert_eq!(outcome.events.len(), 3);
    assert!(outcome.events.iter().all(|event| !matches!(
        event,
        DriverEvent::ResponseReceived { .. } | DriverEvent::ParseFailed { .. }
    )));
}

#[tokio::test]
async fn record_found_below_prose_keeps_full_reply_in_history() {
    let reply = format!("Sure, here is the first step:\n{START}\n");
    let llm = ScriptedLlm::ok(&[reply.as_str(), THINK]);
    let driver = StepDriver::new(&llm, "m");

    let outcome = driver
        .run(&StepSequence::new(["START", "THINK"]).unwrap(), task_turns())
        .await
        .unwrap();

    assert_eq!(
        outcome.records[0],
        record("START", "Solve 3 + 4 * 10 - 4 * 3 - 4 * 3")
    );
    assert_eq!(outcome.requests, 2);
    assert_eq!(
        outcome.turns[2],
        Message::assistant(format!("Sure, here is the first step:\n{START}"))
    );
    assert_eq!(outcome.turns[3], Message::user("Continue to THINK step."));
}

#[tokio::test]
async fn replies_are_trimmed_before_recording() {
    let padded = format!("\n  {START}  \n");
    let llm = ScriptedLlm::ok(&[padded.as_str()]);
    let driver = StepDriver::new(&llm, "m");

    let outcome = driver
        .run(&StepSequence::new(["START"]).unwrap(), task_turns())
        .await
        .unwrap();

    assert_eq!(outcome.turns[2].content, START);
}
