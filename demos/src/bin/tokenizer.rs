use tiktoken_rs::o200k_base;

const EXAMPLES: [&str; 4] = [
    "Hello, how are you?",
    "Hey, How are you?",
    "The quick brown fox jumps over the lazy dog",
    "Generative AI transforms how we work with technology",
];

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> anyhow::Result<()> {
    stepwise_demos::init();
    let bpe = o200k_base()?;

    println!("=== Tokenization Demo ===\n");
    for (index, text) in EXAMPLES.iter().enumerate() {
        println!("Example {}: \"{text}\"", index + 1);

        let tokens = bpe.encode_with_special_tokens(text);
        println!("Token IDs: [{}]", join(&tokens));
        println!("Token count: {}", tokens.len());

        let decoded = bpe.decode(tokens.clone())?;
        println!("Decoded: \"{decoded}\"");
        println!("Match original: {}", decoded == *text);
        println!("{}", "-".repeat(50));
    }

    println!("\n=== Step-by-step Tokenization ===\n");
    let text = "hello world";
    println!("Original text: \"{text}\"");
    let chars: Vec<String> = text.chars().map(|c| format!("'{c}'")).collect();
    println!("Characters: {}", chars.join(", "));

    let tokens = bpe.encode_with_special_tokens(text);
    println!("Tokens: [{}]", join(&tokens));
    for (index, token) in tokens.iter().enumerate() {
        let piece = bpe.decode(vec![*token])?;
        println!("Token {index}: {token} -> \"{piece}\"");
    }

    Ok(())
}
