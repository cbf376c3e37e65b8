//! Reads live schema metadata from SQLite.

use super::{ColumnInfo, ForeignKey, SchemaContext, SchemaSnapshot, TableSchema};
use crate::error::{Result, RetrievalError};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

/// Table name prefixes reserved for SQLite itself and for bookkeeping tables.
pub const INTERNAL_TABLE_PREFIXES: &[&str] = &["sqlite_", "rag_", "cache_", "_ai_"];

/// Whether a table is internal and must stay out of snapshots.
pub fn is_internal_table(name: &str) -> bool {
    INTERNAL_TABLE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Introspects the user tables of a SQLite database.
///
/// Each call reads the catalog afresh; nothing is cached here. Store failures
/// surface as [`RetrievalError::StoreUnavailable`] and are not retried.
#[derive(Clone, Debug)]
pub struct SchemaIntrospector {
    pool: SqlitePool,
}

impl SchemaIntrospector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reads every user table with its columns and foreign keys.
    pub async fn snapshot(&self) -> Result<SchemaSnapshot> {
        let mut tables = BTreeMap::new();
        for name in self.table_names(false).await? {
            let columns = self.columns(&name).await?;
            let foreign_keys = self.foreign_keys(&name).await?;
            tables.insert(
                name,
                TableSchema {
                    columns,
                    foreign_keys,
                },
            );
        }

        tracing::debug!("Introspected {} tables", tables.len());
        Ok(SchemaSnapshot { tables })
    }

    /// Snapshot plus its canonical text and hash.
    pub async fn context(&self) -> Result<SchemaContext> {
        Ok(SchemaContext::from_snapshot(self.snapshot().await?))
    }

    /// Row count per table, for diagnostics.
    ///
    /// A table whose count query fails maps to `None` rather than failing
    /// the whole listing.
    pub async fn table_counts(&self, include_internal: bool) -> Result<BTreeMap<String, Option<i64>>> {
        let mut counts = BTreeMap::new();
        for name in self.table_names(include_internal).await? {
            let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&name));
            let count = sqlx::query_scalar::<_, i64>(&sql)
                .fetch_one(&self.pool)
                .await
                .inspect_err(|e| tracing::debug!("Counting rows of {} failed: {}", name, e))
                .ok();
            counts.insert(name, count);
        }
        Ok(counts)
    }

    async fn table_names(&self, include_internal: bool) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RetrievalError::store("schema_snapshot"))?;

        Ok(names
            .into_iter()
            .filter(|name| include_internal || !is_internal_table(name))
            .collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query(
            r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(RetrievalError::store("schema_snapshot"))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let not_null: i64 = row.get("notnull");
                let pk: i64 = row.get("pk");
                ColumnInfo {
                    name: row.get("name"),
                    declared_type: row.get("type"),
                    nullable: not_null == 0,
                    primary_key: pk > 0,
                }
            })
            .collect())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows = sqlx::query(
            r#"SELECT "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(RetrievalError::store("schema_snapshot"))?;

        Ok(rows
            .into_iter()
            .map(|row| ForeignKey {
                table: row.get("table"),
                from: row.get("from"),
                to: row.get("to"),
            })
            .collect())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
