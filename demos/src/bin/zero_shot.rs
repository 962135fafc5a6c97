use stepwise_core::Message;
use stepwise_llm::OpenAiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stepwise_demos::init();
    let client = OpenAiClient::from_env()?;

    let reply = stepwise_demos::complete(&client, vec![Message::user("Hey, How are you?")]).await?;
    println!("{reply}");
    Ok(())
}
