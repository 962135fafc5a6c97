use std::collections::HashMap;

use serde_json::json;
use stepwise_llm::OpenAiClient;
use stepwise_prompt::{ChatPromptTemplate, MessagePromptTemplate};

const SYSTEM: &str = r#"You are a helpful assistant that only understands {{language}}. Do not answer anything apart from {{language}}.
Example:
Q: Write a function that adds two numbers
A: function add(a, b) {
    return a + b;
}

Q: Do you know about python?
A: I am sorry, I can only help with {{language}} related queries."#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stepwise_demos::init();
    let client = OpenAiClient::from_env()?;

    let prompt = ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system(SYSTEM),
        MessagePromptTemplate::placeholder("history"),
        MessagePromptTemplate::human("{{question}}"),
    ]);

    let mut vars = HashMap::new();
    vars.insert("language".to_string(), json!("JavaScript"));
    vars.insert(
        "history".to_string(),
        json!([
            {"role": "user", "content": "Write a function that adds two numbers"},
            {"role": "assistant", "content": "function add(a, b) {\n  return a + b;\n}"}
        ]),
    );
    vars.insert(
        "question".to_string(),
        json!("Write a function that multiplies two numbers in python"),
    );

    let messages = prompt.format_messages(&vars)?;
    let reply = stepwise_demos::complete(&client, messages).await?;
    println!("{reply}");
    Ok(())
}
