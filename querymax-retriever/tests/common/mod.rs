//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use querymax_embed::{EmbedError, EmbeddingProvider, EmbeddingResult};
use querymax_retriever::storage::database::Database;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Words the keyword embedder counts, one dimension each.
pub const VOCABULARY: &[&str] = &[
    "table", "column", "users", "id", "name", "city", "orders", "order", "total", "amount",
    "email", "product", "price",
];

/// Deterministic embedder: one dimension per vocabulary word, holding the
/// number of times that word occurs as a token of the text.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay_ms: AtomicU64,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embed(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        VOCABULARY
            .iter()
            .map(|word| tokens.iter().filter(|t| *t == word).count() as f32)
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> querymax_embed::Result<EmbeddingResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbedError::Status {
                status: 503,
                body: "model is loading".to_string(),
            });
        }

        Ok(EmbeddingResult::new(
            texts.iter().map(|t| Self::embed(t)).collect(),
        ))
    }

    fn provider_name(&self) -> &str {
        "keyword"
    }
}

/// A file-backed database in a temporary directory.
pub async fn temp_database() -> anyhow::Result<(TempDir, Database)> {
    let temp_dir = tempfile::tempdir()?;
    let db = Database::open(&temp_dir.path().join("database.db")).await?;
    Ok((temp_dir, db))
}

/// A temporary database containing `users(id, name, city)`.
pub async fn users_database() -> anyhow::Result<(TempDir, Database)> {
    let (temp_dir, db) = temp_database().await?;
    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, city TEXT)")
        .execute(db.pool())
        .await?;
    Ok((temp_dir, db))
}
