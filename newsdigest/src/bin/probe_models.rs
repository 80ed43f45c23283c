use common::Config;
use newsdigest::llm::{GeminiProvider, GenerationProvider, GenerationRequest, ModelCandidate};
use std::path::PathBuf;

/// Sends a one-line prompt to every configured model and reports which ones answer.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let override_path = std::env::args().nth(1).map(PathBuf::from);
    let default_path = PathBuf::from("config.default.toml");
    let config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await?;

    let api_key = config.api_key()?;
    let provider = GeminiProvider::new(config.llm.api_url.clone(), api_key)?
        .with_timeout(config.llm.timeout_seconds.unwrap_or(30));

    println!("\n{}", "=".repeat(60));
    println!("Probing generation models");
    println!("Base URL: {}", config.llm.api_url);
    println!("{}", "=".repeat(60));

    let request = GenerationRequest::new("Reply with the single word: ready");
    let mut available = 0;

    for model in config.llm.models.iter().cloned().map(ModelCandidate::from) {
        match provider.generate(&model, &request).await {
            Ok(text) => {
                available += 1;
                println!("✓ {}: {}", model, text.trim());
            }
            Err(e) => {
                let hint = if e.is_transient() { " (transient)" } else { "" };
                eprintln!("✗ {}: {}{}", model, e, hint);
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("{}/{} models available", available, config.llm.models.len());
    println!("{}", "=".repeat(60));
    Ok(())
}
