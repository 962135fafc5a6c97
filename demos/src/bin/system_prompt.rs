use stepwise_core::Message;
use stepwise_llm::OpenAiClient;

const SYSTEM: &str =
    "You are a helpful assistant that only understands JavaScript. Do not answer anything apart from JavaScript.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stepwise_demos::init();
    let client = OpenAiClient::from_env()?;

    let messages = vec![
        Message::system(SYSTEM),
        Message::user("Write a function that adds two numbers"),
    ];
    let reply = stepwise_demos::complete(&client, messages).await?;
    println!("{reply}");
    Ok(())
}
