//! Storage abstraction layer for retrieval documents
//!
//! This module provides the trait-based abstraction for persisting the
//! schema-derived documents and their embeddings, separating persistence from
//! the retrieval logic.
//!
//! ## Key Components
//!
//! - **Document / DocType**: A retrievable unit of schema text plus its embedding
//! - **DocumentStore**: Full-replace writes, full-scan reads and small key/value metadata
//! - **Database**: SQLite connection pool and table setup
//! - **SqliteDocumentStore**: The SQLite-backed `DocumentStore`
//!
//! ## Architecture
//!
//! ```text
//! DocumentStore ── SqliteDocumentStore ── Database (SqlitePool)
//!                                             │
//!                      SchemaIntrospector ────┘
//! ```
//!
//! The store never updates or deletes individual documents. The only mutation
//! is [`DocumentStore::replace_all`], which swaps the whole corpus in one
//! transaction.

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub mod database;
pub mod sqlite_store;

/// Metadata key holding the schema hash of the last successful rebuild.
pub const SCHEMA_HASH_KEY: &str = "schema_hash";

/// Metadata key holding the RFC 3339 time of the last successful rebuild.
pub const REBUILT_AT_KEY: &str = "rebuilt_at";

/// Kind of schema object a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Table,
    Column,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Table => "table",
            DocType::Column => "column",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(DocType::Table),
            "column" => Ok(DocType::Column),
            other => Err(format!("unknown document type: {other}")),
        }
    }
}

/// A retrievable document with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doc_type: DocType,
    pub table_name: String,
    pub column_name: Option<String>,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Persistence for the document corpus and its bookkeeping metadata.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the entire corpus, discarding whatever was stored before.
    ///
    /// The documents and the `meta` entries are written as one unit: either
    /// all of them become visible or none do.
    async fn replace_all(&self, documents: &[Document], meta: &[(&str, &str)]) -> Result<()>;

    /// Load every stored document in rebuild order
    async fn load_all(&self) -> Result<Vec<Document>>;

    /// Number of stored documents
    async fn count(&self) -> Result<usize>;

    /// Insert or overwrite a metadata value
    async fn put_meta(&self, key: &str, value: &str) -> Result<()>;

    /// Read a metadata value
    async fn get_meta(&self, key: &str) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_type_round_trips_through_text() {
        for doc_type in [DocType::Table, DocType::Column] {
            assert_eq!(doc_type.as_str().parse::<DocType>(), Ok(doc_type));
        }
        assert!("note".parse::<DocType>().is_err());
        assert_eq!(DocType::Column.to_string(), "column");
        assert_eq!(
            serde_json::to_string(&DocType::Table).unwrap(),
            "\"table\""
        );
    }
}
