use std::time::Duration;

use clap::Parser;
use stepwise_agent::{DriverEvent, FixedDelayPolicy, StepDriver, StepSequence};
use stepwise_core::Message;
use stepwise_llm::{OpenAiClient, OpenAiConfig};
use stepwise_prompt::step_protocol_system_prompt;

/// Walks the model through START, THINK and OUTPUT one turn at a time.
#[derive(Debug, Parser)]
#[command(name = "chain_prompt_auto")]
struct Args {
    /// Model to use instead of the configured default.
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Pause after a failed request before retrying.
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Requests allowed per step. Unbounded when omitted.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// The problem to solve.
    #[arg(default_value = "Can you solve 3 + 4 * 10 - 4 * 3 - 4 * 3")]
    problem: String,
}

fn print_event(event: &DriverEvent) {
    match event {
        DriverEvent::StepStarted { expected, .. } => println!("⏳ Processing step: {expected}..."),
        DriverEvent::ResponseReceived { raw, .. } => println!("💬 Raw response: {raw}"),
        DriverEvent::RequestFailed { error, .. } => {
            println!("❌ Request failed: {error}");
            println!("🔄 Retrying step...");
        }
        DriverEvent::ParseFailed { reason, .. } => {
            println!("❌ Failed to parse JSON: {reason}");
            println!("🔄 Retrying...");
        }
        DriverEvent::StepMismatch { expected, got, .. } => {
            println!("⚠️  Expected step '{expected}' but got '{got}'. Continuing...");
        }
        DriverEvent::StepAdvanced { record, .. } => {
            let marker = match record.step.as_str() {
                "START" => "🚀",
                "THINK" => "🤔",
                _ => "✅",
            };
            println!("{marker} {}: {}\n", record.step, record.content);
        }
        DriverEvent::Completed { .. } => println!("🎉 Chain Prompt Auto Process Completed!"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stepwise_demos::init();
    let args = Args::parse();

    let mut config = OpenAiConfig::from_env()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    let client = OpenAiClient::from_config(config)?;

    let mut policy = FixedDelayPolicy::new(Duration::from_millis(args.retry_delay_ms));
    if let Some(max_attempts) = args.max_attempts {
        policy = policy.with_max_attempts(max_attempts);
    }

    let steps = StepSequence::start_think_output();
    let turns = vec![
        Message::system(step_protocol_system_prompt(steps.labels())?),
        Message::user(args.problem.clone()),
    ];

    println!("🚀 Starting Chain Prompt Auto Process...\n");
    println!("📝 Problem: {}\n", args.problem);

    let model = client.model().to_string();
    let driver = StepDriver::new(client, model)
        .with_policy(policy)
        .with_observer(print_event);
    let outcome = driver.run(&steps, turns).await?;

    tracing::info!(
        requests = outcome.requests,
        turns = outcome.turns.len(),
        "run finished"
    );
    Ok(())
}
