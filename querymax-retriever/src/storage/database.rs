//! SQLite connection setup for the backing store.
//!
//! The same database file holds the user schema being described and the two
//! bookkeeping tables of the retrieval index:
//!
//! ```sql
//! -- One row per retrievable document, fully replaced on each rebuild
//! CREATE TABLE rag_documents (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     doc_type TEXT NOT NULL,          -- 'table' | 'column'
//!     table_name TEXT NOT NULL,
//!     column_name TEXT,                -- NULL for table documents
//!     text TEXT NOT NULL,
//!     embedding BLOB NOT NULL,         -- f32 vector, native byte order
//!     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
//! );
//!
//! -- Small key/value bookkeeping (last schema hash, last rebuild time)
//! CREATE TABLE rag_meta (
//!     key TEXT PRIMARY KEY,
//!     value TEXT NOT NULL
//! );
//! ```
//!
//! Both tables carry the `rag_` prefix so schema introspection skips them.

use crate::error::{Result, RetrievalError};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};

/// Handle on the backing SQLite database.
#[derive(Clone, Debug)]
pub struct Database {
    path: Option<PathBuf>,
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if missing) the database file and ensures the index tables exist.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .foreign_keys(true)
                .create_if_missing(true),
        )
        .await
        .map_err(RetrievalError::store("open"))?;

        tracing::info!("Opened backing store at {}", path.display());
        Self::new_with_pool(Some(path.to_path_buf()), pool).await
    }

    /// Opens an in-memory database for testing.
    ///
    /// The pool is capped at one connection because every SQLite in-memory
    /// connection would otherwise see its own empty database.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(RetrievalError::store("open"))?;
        Self::new_with_pool(None, pool).await
    }

    async fn new_with_pool(path: Option<PathBuf>, pool: SqlitePool) -> Result<Self> {
        let db = Self { path, pool };
        db.ensure_tables().await?;
        Ok(db)
    }

    /// Create the index tables if needed. Idempotent.
    pub async fn ensure_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rag_documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doc_type TEXT NOT NULL,
                table_name TEXT NOT NULL,
                column_name TEXT,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(RetrievalError::store("ensure_tables"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rag_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(RetrievalError::store("ensure_tables"))?;

        Ok(())
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
