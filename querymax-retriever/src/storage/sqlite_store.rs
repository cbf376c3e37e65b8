//! SQLite implementation of [`DocumentStore`].
//!
//! Embeddings are stored as raw `f32` bytes (via `bytemuck`); decoding copies
//! into a fresh, correctly aligned `Vec<f32>`.

use super::{DocType, Document, DocumentStore};
use crate::error::{Result, RetrievalError};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// SQLite-based document store. See module docs for the storage format.
#[derive(Clone, Debug)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Creates a store over a pool whose tables were set up by [`super::database::Database`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn encode_embedding(embedding: &[f32]) -> &[u8] {
    bytemuck::cast_slice::<f32, u8>(embedding)
}

fn decode_embedding(bytes: &[u8]) -> std::result::Result<Vec<f32>, sqlx::Error> {
    if bytes.len() % std::mem::size_of::<f32>() != 0 {
        return Err(sqlx::Error::Decode(
            format!("embedding blob of {} bytes is not a whole number of f32", bytes.len()).into(),
        ));
    }
    Ok(bytemuck::pod_collect_to_vec::<u8, f32>(bytes))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn replace_all(&self, documents: &[Document], meta: &[(&str, &str)]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(RetrievalError::store("replace_all"))?;

        let result: std::result::Result<(), sqlx::Error> = async {
            sqlx::query("DELETE FROM rag_documents").execute(&mut *tx).await?;

            for document in documents {
                sqlx::query(
                    r#"
                    INSERT INTO rag_documents (doc_type, table_name, column_name, text, embedding)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .bind(document.doc_type.as_str())
                .bind(&document.table_name)
                .bind(&document.column_name)
                .bind(&document.text)
                .bind(encode_embedding(&document.embedding))
                .execute(&mut *tx)
                .await?;
            }

            for (key, value) in meta {
                upsert_meta(&mut tx, key, value).await?;
            }
            Ok(())
        }
        .await;

        // Dropping `tx` on the error path rolls the whole replacement back.
        result.map_err(RetrievalError::store("replace_all"))?;
        tx.commit().await.map_err(RetrievalError::store("replace_all"))?;

        tracing::debug!("Replaced document corpus with {} documents", documents.len());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT doc_type, table_name, column_name, text, embedding FROM rag_documents ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RetrievalError::store("load_all"))?;

        rows.into_iter()
            .map(|row| -> std::result::Result<Document, sqlx::Error> {
                let doc_type: String = row.get("doc_type");
                let doc_type = doc_type
                    .parse::<DocType>()
                    .map_err(|e| sqlx::Error::Decode(e.into()))?;
                let embedding_bytes: Vec<u8> = row.get("embedding");

                Ok(Document {
                    doc_type,
                    table_name: row.get("table_name"),
                    column_name: row.get("column_name"),
                    text: row.get("text"),
                    embedding: decode_embedding(&embedding_bytes)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(RetrievalError::store("load_all"))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_documents")
            .fetch_one(&self.pool)
            .await
            .map_err(RetrievalError::store("count"))?;
        Ok(count as usize)
    }

    async fn put_meta(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(RetrievalError::store("put_meta"))?;
        upsert_meta(&mut conn, key, value)
            .await
            .map_err(RetrievalError::store("put_meta"))
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT value FROM rag_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(RetrievalError::store("get_meta"))
    }
}

async fn upsert_meta(
    conn: &mut sqlx::SqliteConnection,
    key: &str,
    value: &str,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO rag_meta (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
