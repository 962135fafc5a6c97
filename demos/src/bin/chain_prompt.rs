use stepwise_agent::extract_step_record;
use stepwise_core::Message;
use stepwise_llm::OpenAiClient;

const SYSTEM: &str = r#"You are a helpful assistant who works on START, THINK and OUTPUT format.
For a given user query first think and break down the problem into smaller subproblems.
For any question, you will first think about the answer and then provide the final answer.
Before outputting the final answer, make sure to verify the answer once again.

Rules:
- Always think step by step.
- Always verify the answer once again before providing the final answer.
- Always provide the final answer in OUTPUT section.
- Put each step on its own line.

Output JSON format:
{"step":"START | THINK | OUTPUT", "content":"string"}

Example:
User: Can you solve 3 + 4 * 10 - 4 * 3
Assistant: {"step":"START", "content":"The user wants to solve the mathematical expression 3 + 4 * 10 - 4 * 3."}
Assistant: {"step":"THINK", "content":"Following the order of operations, multiply first: 4 * 10 = 40 and 4 * 3 = 12. Then 3 + 40 - 12 = 31."}
Assistant: {"step":"OUTPUT", "content":"The final answer is 31."}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stepwise_demos::init();
    let client = OpenAiClient::from_env()?;

    let messages = vec![
        Message::system(SYSTEM),
        Message::user("Can you solve 3 + 4 * 10 - 4 * 3 - 4 * 3"),
    ];
    let reply = stepwise_demos::complete(&client, messages).await?;
    println!("{reply}\n");

    for line in reply.lines().filter(|line| !line.trim().is_empty()) {
        let line = line.trim().trim_start_matches("Assistant:").trim();
        match extract_step_record(line) {
            Ok(record) => println!("{}: {}", record.step, record.content),
            Err(err) => tracing::debug!(error = %err, "skipping line without a step record"),
        }
    }
    Ok(())
}
