//! Live relational schema snapshots.
//!
//! A [`SchemaSnapshot`] captures every user table of the backing store with
//! its columns and foreign keys. Snapshots are immutable once built and are
//! replaced wholesale when the schema changes.
//!
//! ## Canonical Text
//!
//! [`SchemaSnapshot::to_text`] serializes a snapshot as
//!
//! ```text
//! orders(order_id INTEGER, user_id INTEGER) ; users(id INTEGER, name TEXT)
//! ```
//!
//! The text is deterministic for a given snapshot (tables in name order,
//! columns in declaration order). It doubles as LLM prompt context and as the
//! input of [`schema_hash`], which is used purely to detect schema drift.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod introspector;

pub use introspector::SchemaIntrospector;

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared SQL type as written in the DDL (may be empty in SQLite)
    pub declared_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// A foreign-key edge from a local column to a column of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Referenced table
    pub table: String,
    /// Local column
    pub from: String,
    /// Remote column; `None` when the reference targets the primary key implicitly
    pub to: Option<String>,
}

/// Columns and foreign keys of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// Ordered mapping of table name to table schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeMap<String, TableSchema>,
}

impl SchemaSnapshot {
    /// Canonical single-line serialization of the snapshot.
    pub fn to_text(&self) -> String {
        self.tables
            .iter()
            .map(|(name, table)| {
                let columns = table
                    .columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.declared_type))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}({columns})")
            })
            .collect::<Vec<_>>()
            .join(" ; ")
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of documents a rebuild derives from this snapshot:
    /// one per table plus one per column.
    pub fn document_count(&self) -> usize {
        self.tables.values().map(|t| 1 + t.columns.len()).sum()
    }
}

/// Content hash of canonical schema text (lowercase hex BLAKE3).
pub fn schema_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Schema text, snapshot and hash captured together.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaContext {
    pub text: String,
    pub snapshot: Arc<SchemaSnapshot>,
    pub hash: String,
}

impl SchemaContext {
    pub fn from_snapshot(snapshot: SchemaSnapshot) -> Self {
        let text = snapshot.to_text();
        let hash = schema_hash(&text);
        Self {
            text,
            snapshot: Arc::new(snapshot),
            hash,
        }
    }
}
