use stepwise_core::{cosine_similarity, Embedding};
use stepwise_embeddings::OpenAiEmbedding;
use stepwise_llm::OpenAiConfig;

const SMALL: (&str, usize) = ("text-embedding-3-small", 1536);
const LARGE: (&str, usize) = ("text-embedding-3-large", 3072);

const EXAMPLES: [&str; 5] = [
    "Hey, How are you?",
    "A river bank",
    "A ICICI bank",
    "Dog chase cat",
    "Cat chase dog",
];

const PAIRS: [(&str, &str); 4] = [
    ("A river bank", "A ICICI bank"),
    ("Dog chase cat", "Cat chase dog"),
    ("Hello world", "Hey there"),
    ("Machine learning", "Artificial intelligence"),
];

fn preview(values: &[f32], count: usize) -> String {
    values
        .iter()
        .take(count)
        .map(|value| format!("{value:.6}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn explain() {
    println!("\n=== Understanding Embeddings ===\n");
    println!("What are embeddings?");
    println!("- Numerical representations of text in high-dimensional space");
    println!("- Similar meanings have similar vector positions");
    println!("- Enable mathematical operations on text\n");
    println!("Model specifications:");
    println!("- {}: {} dimensions", SMALL.0, SMALL.1);
    println!("- {}: {} dimensions", LARGE.0, LARGE.1);
    println!("- Higher dimensions = more detailed representations\n");
    println!("Use cases:");
    println!("- Semantic search");
    println!("- Document similarity");
    println!("- Content recommendation");
    println!("- Clustering and classification");
}

fn embedder(
    config: &OpenAiConfig,
    api_key: &str,
    (model, dimension): (&str, usize),
) -> OpenAiEmbedding {
    OpenAiEmbedding::new(api_key, model, dimension)
        .with_base_url(config.base_url.clone())
        .with_timeout(config.timeout)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stepwise_demos::init();

    let api_key = match std::env::var(OpenAiConfig::API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            println!("⚠️  Please set your {} in the .env file", OpenAiConfig::API_KEY_VAR);
            println!(
                "Create a .env file with: {}=your_api_key_here",
                OpenAiConfig::API_KEY_VAR
            );
            explain();
            return Ok(());
        }
    };
    let config = OpenAiConfig::from_env()?;
    let small = embedder(&config, &api_key, SMALL);

    println!("=== Embedding Demo ===\n");
    for text in EXAMPLES {
        match small.embed(text).await {
            Ok(vector) => {
                println!("Text: \"{text}\"");
                println!("Vector dimensions: {}", vector.len());
                println!("First 5 values: [{}...]", preview(&vector, 5));
                println!("Model used: {}", small.model());
                println!("{}", "-".repeat(50));
            }
            Err(err) => tracing::error!(text, error = %err, "failed to create embedding"),
        }
    }

    println!("\n=== Model Comparison ===\n");
    for spec in [SMALL, LARGE] {
        let model = embedder(&config, &api_key, spec);
        match model.embed(EXAMPLES[0]).await {
            Ok(vector) => {
                println!("Model: {}", model.model());
                println!("Vector size: {}", vector.len());
                println!("Sample values: [{}...]", preview(&vector, 3));
                println!("{}", "-".repeat(30));
            }
            Err(err) => tracing::error!(model = spec.0, error = %err, "failed to create embedding"),
        }
    }

    println!("\n=== Semantic Similarity Demo ===\n");
    for (first, second) in PAIRS {
        let inputs = vec![first.to_string(), second.to_string()];
        match small.embed_batch(&inputs).await {
            Ok(vectors) => {
                let similarity = cosine_similarity(&vectors[0], &vectors[1]);
                println!("Text 1: \"{first}\"");
                println!("Text 2: \"{second}\"");
                println!("Cosine similarity: {similarity:.4}");
                println!("Similarity percentage: {:.2}%", similarity * 100.0);
                println!("{}", "-".repeat(50));
            }
            Err(err) => tracing::error!(first, second, error = %err, "failed to embed pair"),
        }
    }

    explain();
    Ok(())
}
