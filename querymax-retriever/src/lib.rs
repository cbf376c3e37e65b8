//! querymax-retriever: schema-aware semantic retrieval over a live SQLite database
//!
//! The crate turns the tables and columns of a database into small text
//! documents, embeds them through an external embedding service and answers
//! natural-language questions with the most relevant schema fragments. The
//! results are meant as prompt context for text-to-SQL generation.
//!
//! ## Key Modules
//!
//! - **[`schema`]**: Live schema snapshots, canonical schema text and drift hashes
//! - **[`storage`]**: Persistence of the document corpus and bookkeeping metadata
//! - **[`retrieval`]**: Document synthesis, the vector index and [`RetrievalService`]
//! - **[`config`]**: Environment-driven configuration
//! - **[`demo`]**: A retail demo schema with seed rows
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use querymax_retriever::{RetrievalConfig, RetrievalService};
//!
//! # async fn example() -> querymax_retriever::Result<()> {
//! let config = RetrievalConfig::from_env()?;
//! let (service, _db) = RetrievalService::open(&config).await?;
//! service.startup().await?;
//! service.rebuild_from_schema().await?;
//!
//! for text in service.retrieve("which city do users live in", None).await? {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SQLite schema → SchemaIntrospector → synthesize → EmbeddingProvider
//!                                                         ↓
//! retrieve ← VectorIndex ← load_all ← DocumentStore ← replace_all
//! ```

pub mod config;
pub mod demo;
pub mod error;
pub mod retrieval;
pub mod schema;
pub mod storage;

pub use config::RetrievalConfig;
pub use error::{Result, RetrievalError};
pub use retrieval::{IndexStats, RebuildReport, RetrievalService, ServiceState};
