//! Builds the demo retail schema in a scratch database and asks a few questions.
//!
//! Needs a running Ollama-compatible embedding service; point `QM_OLLAMA_URL`
//! and `QM_EMBED_MODEL` at it if it is not on the default address.

use anyhow::Result;
use querymax_retriever::{RetrievalConfig, RetrievalService, demo};
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let temp_dir = tempdir()?;
    let config = RetrievalConfig::from_env()?.with_db_path(temp_dir.path().join("demo.db"));

    let (service, db) = RetrievalService::open(&config).await?;
    demo::init_schema(db.pool()).await?;
    demo::seed(db.pool()).await?;

    service.startup().await?;
    let report = service.rebuild_from_schema().await?;
    println!(
        "Indexed {} documents ({}-dimensional) in {:.0} ms\n",
        report.documents_indexed,
        report.embedding_dim,
        report.duration_ms()
    );

    for question in [
        "Which city do most users live in?",
        "Total revenue per payment method",
        "Products that are low on stock",
    ] {
        println!("Q: {question}");
        for text in service.retrieve(question, Some(3)).await? {
            println!("   {text}");
        }
        println!();
    }

    let stats = service.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
