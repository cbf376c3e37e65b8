//! Simple example embedding a few texts against a running Ollama-compatible service

use querymax_embed::{EmbedConfig, EmbeddingProvider, HttpEmbeddingProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url = std::env::var("QM_OLLAMA_URL")
        .unwrap_or_else(|_| querymax_embed::config::DEFAULT_BASE_URL.to_string());
    let config = EmbedConfig::new(base_url, "nomic-embed-text").with_batch_size(2);

    println!("Embedding with model {} at {}", config.model_name, config.endpoint_url());
    let provider = HttpEmbeddingProvider::new(config)?;

    let texts = vec![
        "Table users: columns = [id, name, city]".to_string(),
        "Column users.city: type=TEXT".to_string(),
        "Column orders.total_amount: type=REAL".to_string(),
    ];

    let result = provider.embed_texts(&texts).await?;
    println!(
        "Generated {} embeddings of dimension {}",
        result.len(),
        result.dimension
    );

    for (text, embedding) in texts.iter().zip(result.embeddings.iter()) {
        println!("  {text}");
        println!("    first values: {:?}", &embedding[..3.min(embedding.len())]);
    }

    Ok(())
}
