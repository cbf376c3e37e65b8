//! Derives retrievable documents from a schema snapshot.
//!
//! For every table, in snapshot order, one table document listing its column
//! names is followed by one column document per column:
//!
//! ```text
//! Table users: columns = [id, name, city]
//! Column users.id: type=INTEGER
//! Column users.name: type=TEXT
//! Column users.city: type=TEXT
//! ```
//!
//! Synthesis is pure: identical snapshots always yield identical,
//! identically ordered documents, which keeps rebuilds reproducible.

use crate::schema::SchemaSnapshot;
use crate::storage::{DocType, Document};

/// A synthesized document that has not been embedded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDocument {
    pub doc_type: DocType,
    pub table_name: String,
    pub column_name: Option<String>,
    pub text: String,
}

impl DraftDocument {
    /// Attach an embedding, producing a storable document.
    pub fn with_embedding(self, embedding: Vec<f32>) -> Document {
        Document {
            doc_type: self.doc_type,
            table_name: self.table_name,
            column_name: self.column_name,
            text: self.text,
            embedding,
        }
    }
}

/// Synthesize the document corpus for a snapshot.
pub fn synthesize(snapshot: &SchemaSnapshot) -> Vec<DraftDocument> {
    let mut documents = Vec::with_capacity(snapshot.document_count());

    for (table, schema) in &snapshot.tables {
        let column_names = schema
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        documents.push(DraftDocument {
            doc_type: DocType::Table,
            table_name: table.clone(),
            column_name: None,
            text: format!("Table {table}: columns = [{column_names}]"),
        });

        for column in &schema.columns {
            documents.push(DraftDocument {
                doc_type: DocType::Column,
                table_name: table.clone(),
                column_name: Some(column.name.clone()),
                text: format!(
                    "Column {table}.{}: type={}",
                    column.name, column.declared_type
                ),
            });
        }
    }

    documents
}
