//! The retrieval service: owns the live vector index and its lifecycle.
//!
//! ## States
//!
//! ```text
//! Uninitialized ──startup()──► SchemaCached ──► IndexLoaded
//!                                                  │  ▲
//!                                                  └──┘ rebuild_from_schema()
//! ```
//!
//! ## Two-speed freshness
//!
//! [`RetrievalService::get_schema_context`] re-introspects on every call and
//! replaces the cached schema text when its hash changes. The vector index is
//! not touched by that refresh: it only changes when
//! [`RetrievalService::rebuild_from_schema`] runs, so retrieval may lag behind
//! schema changes until a caller asks for a rebuild.
//!
//! ## Concurrency
//!
//! The live index is an immutable `Arc<VectorIndex>` behind a `RwLock`.
//! Readers clone the `Arc` and release the lock before embedding or scoring,
//! so they never block each other. A rebuild embeds and builds the new index
//! without holding the lock, then swaps the pointer under a short write
//! section; in-flight readers keep whichever generation they cloned. Rebuilds
//! are serialized by a separate mutex that readers never touch; `startup`
//! holds it while loading and swapping the persisted corpus.

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::retrieval::synthesizer::synthesize;
use crate::retrieval::vector_index::VectorIndex;
use crate::schema::{SchemaContext, SchemaIntrospector};
use crate::storage::database::Database;
use crate::storage::sqlite_store::SqliteDocumentStore;
use crate::storage::{DocumentStore, REBUILT_AT_KEY, SCHEMA_HASH_KEY};
use querymax_embed::{EmbeddingProvider, HttpEmbeddingProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Lifecycle state of a [`RetrievalService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    /// Nothing cached yet
    Uninitialized,
    /// Schema text is cached but no index has been loaded
    SchemaCached,
    /// A (possibly empty) vector index is live
    IndexLoaded,
}

/// Outcome of a successful rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    pub documents_indexed: usize,
    pub embedding_dim: usize,
    pub duration: Duration,
}

impl RebuildReport {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// Corpus statistics reported by [`RetrievalService::stats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of persisted documents
    pub documents: usize,
    /// Dimensionality of the live index, 0 when empty or not loaded
    pub embed_dim: usize,
    /// Schema hash recorded by the last successful rebuild
    pub last_hash: Option<String>,
    /// RFC 3339 time of the last successful rebuild
    pub last_rebuilt_at: Option<String>,
}

/// Schema-aware semantic retrieval over a live database.
pub struct RetrievalService {
    introspector: SchemaIntrospector,
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    schema: RwLock<Option<SchemaContext>>,
    index: RwLock<Option<Arc<VectorIndex>>>,
    rebuild_gate: Mutex<()>,
}

impl RetrievalService {
    pub fn new(
        introspector: SchemaIntrospector,
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            introspector,
            store,
            embedder,
            top_k,
            schema: RwLock::new(None),
            index: RwLock::new(None),
            rebuild_gate: Mutex::new(()),
        }
    }

    /// Create a service whose schema and documents both live in `db`.
    pub fn with_database(db: &Database, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self::new(
            SchemaIntrospector::new(db.pool().clone()),
            Arc::new(SqliteDocumentStore::new(db.pool().clone())),
            embedder,
            top_k,
        )
    }

    /// Open the configured database and HTTP embedding client.
    ///
    /// The returned service is still [`ServiceState::Uninitialized`]; call
    /// [`startup`](Self::startup) before serving requests.
    pub async fn open(config: &RetrievalConfig) -> Result<(Self, Database)> {
        let embedder = HttpEmbeddingProvider::new(config.embed.clone())
            .map_err(|e| RetrievalError::invalid_config(e.to_string()))?;
        let db = Database::open(&config.db_path).await?;
        let service = Self::with_database(&db, Arc::new(embedder), config.top_k);
        Ok((service, db))
    }

    /// Default number of results for [`retrieve`](Self::retrieve)
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn state(&self) -> ServiceState {
        if self.index.read().await.is_some() {
            ServiceState::IndexLoaded
        } else if self.schema.read().await.is_some() {
            ServiceState::SchemaCached
        } else {
            ServiceState::Uninitialized
        }
    }

    /// The live index, if one has been loaded.
    pub async fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().await.clone()
    }

    /// Cache the schema and load whatever corpus is currently persisted.
    ///
    /// The loaded corpus may be empty, or stale relative to the live schema;
    /// neither is an error.
    pub async fn startup(&self) -> Result<()> {
        let context = self.introspector.context().await?;
        info!(
            "Cached schema with {} tables (hash {})",
            context.snapshot.tables.len(),
            context.hash
        );
        let current_hash = context.hash.clone();
        *self.schema.write().await = Some(context);

        // Load and swap as one step relative to rebuilds
        let _gate = self.rebuild_gate.lock().await;
        let index = VectorIndex::build(self.store.load_all().await?)?;
        if let Some(indexed_hash) = self.store.get_meta(SCHEMA_HASH_KEY).await? {
            if indexed_hash != current_hash {
                warn!(
                    "Persisted index was built for schema {}, live schema is {}; rebuild to refresh",
                    indexed_hash, current_hash
                );
            }
        }
        info!(
            "Loaded index with {} documents (dimension {})",
            index.len(),
            index.dimension()
        );
        *self.index.write().await = Some(Arc::new(index));
        Ok(())
    }

    /// Current schema text, snapshot and hash.
    ///
    /// Always re-introspects. When the hash changed, the cached context is
    /// replaced; the vector index is left as it is.
    pub async fn get_schema_context(&self) -> Result<SchemaContext> {
        let fresh = self.introspector.context().await?;

        let mut cached = self.schema.write().await;
        if let Some(current) = cached.as_ref() {
            if current.hash == fresh.hash {
                return Ok(current.clone());
            }
            warn!(
                "Schema changed ({} -> {}); retrieval index is stale until the next rebuild",
                current.hash, fresh.hash
            );
        }
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Regenerate, persist and swap in the whole document corpus.
    ///
    /// On any failure the live index is left untouched.
    pub async fn rebuild_from_schema(&self) -> Result<RebuildReport> {
        let _gate = self.rebuild_gate.lock().await;
        let started = Instant::now();

        let context = self.introspector.context().await?;
        let drafts = synthesize(&context.snapshot);
        info!(
            "Rebuilding index: {} documents from {} tables",
            drafts.len(),
            context.snapshot.tables.len()
        );

        let texts: Vec<String> = drafts.iter().map(|d| d.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            let result = self
                .embedder
                .embed_texts(&texts)
                .await
                .map_err(RetrievalError::embedding("rebuild_from_schema"))?;
            result
                .validate(texts.len())
                .map_err(RetrievalError::embedding("rebuild_from_schema"))?;
            result.embeddings
        };
        debug!("Embedded {} documents via {}", embeddings.len(), self.embedder.provider_name());

        let documents: Vec<_> = drafts
            .into_iter()
            .zip(embeddings)
            .map(|(draft, embedding)| draft.with_embedding(embedding))
            .collect();

        let rebuilt_at = chrono::Utc::now().to_rfc3339();
        self.store
            .replace_all(
                &documents,
                &[
                    (SCHEMA_HASH_KEY, context.hash.as_str()),
                    (REBUILT_AT_KEY, rebuilt_at.as_str()),
                ],
            )
            .await?;

        let index = Arc::new(VectorIndex::build(self.store.load_all().await?)?);
        let report = RebuildReport {
            documents_indexed: index.len(),
            embedding_dim: index.dimension(),
            duration: started.elapsed(),
        };

        *self.index.write().await = Some(index);
        *self.schema.write().await = Some(context);

        info!(
            "Rebuilt index with {} documents (dimension {}) in {:.1} ms",
            report.documents_indexed,
            report.embedding_dim,
            report.duration_ms()
        );
        Ok(report)
    }

    /// Texts of the `k` documents most similar to `question`.
    ///
    /// `k` defaults to the configured top-k. Before startup, or with an empty
    /// corpus, this returns no documents without contacting the embedder.
    pub async fn retrieve(&self, question: &str, k: Option<usize>) -> Result<Vec<String>> {
        let k = k.unwrap_or(self.top_k);
        let index = match self.current_index().await {
            Some(index) if !index.is_empty() => index,
            _ => {
                debug!("Retrieve against empty index");
                return Ok(Vec::new());
            }
        };

        let query = self
            .embedder
            .embed_text(question)
            .await
            .map_err(RetrievalError::embedding("retrieve"))?;
        let results = index.query(&query, k)?;
        debug!("Retrieved {} of {} documents", results.len(), index.len());
        Ok(results)
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        let embed_dim = self
            .current_index()
            .await
            .map_or(0, |index| index.dimension());
        Ok(IndexStats {
            documents: self.store.count().await?,
            embed_dim,
            last_hash: self.store.get_meta(SCHEMA_HASH_KEY).await?,
            last_rebuilt_at: self.store.get_meta(REBUILT_AT_KEY).await?,
        })
    }
}
