//! In-memory cosine-similarity index over document embeddings.
//!
//! The index keeps document texts and metadata in one sequence and the
//! L2-normalized embeddings in a row-major matrix, row `i` belonging to
//! document `i`. Because every row and every query is unit length, cosine
//! similarity is a plain dot product.
//!
//! Corpus sizes are small (tens to low thousands of documents), so queries
//! are an exhaustive scan followed by a stable sort.

use crate::error::{Result, RetrievalError};
use crate::storage::{DocType, Document};
use querymax_embed::EmbedError;

/// Added to the norm before dividing so all-zero vectors stay finite.
pub const NORM_EPSILON: f32 = 1e-12;

/// Scale a vector to unit L2 norm, in place.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm + NORM_EPSILON;
    for value in vector.iter_mut() {
        *value /= denom;
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Metadata of an indexed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub doc_type: DocType,
    pub table_name: String,
    pub column_name: Option<String>,
}

/// A ranked query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Position of the document in index order
    pub position: usize,
    /// Cosine similarity to the query, in `[-1, 1]`
    pub similarity: f32,
}

/// Normalized embedding matrix aligned with document texts and metadata.
///
/// Row count always equals the number of documents. All rows share one
/// dimensionality; an empty index has zero rows and dimension zero.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    texts: Vec<String>,
    meta: Vec<DocumentMeta>,
    matrix: Vec<f32>,
    dimension: usize,
}

impl VectorIndex {
    /// An index with no documents.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index from documents, preserving their order.
    ///
    /// Fails with [`RetrievalError::IndexIncompatible`] when the embeddings do
    /// not all share the dimensionality of the first one, and with
    /// [`RetrievalError::EmbeddingUnavailable`] when that dimensionality is zero.
    pub fn build(documents: Vec<Document>) -> Result<Self> {
        let Some(first) = documents.first() else {
            return Ok(Self::empty());
        };
        let dimension = first.embedding.len();
        if dimension == 0 {
            return Err(RetrievalError::embedding("build_index")(EmbedError::malformed(
                "zero-dimensional embeddings",
            )));
        }

        let mut texts = Vec::with_capacity(documents.len());
        let mut meta = Vec::with_capacity(documents.len());
        let mut matrix = Vec::with_capacity(documents.len() * dimension);

        for document in documents {
            if document.embedding.len() != dimension {
                return Err(RetrievalError::IndexIncompatible {
                    expected: dimension,
                    actual: document.embedding.len(),
                });
            }
            let start = matrix.len();
            matrix.extend_from_slice(&document.embedding);
            normalize(&mut matrix[start..]);

            texts.push(document.text);
            meta.push(DocumentMeta {
                doc_type: document.doc_type,
                table_name: document.table_name,
                column_name: document.column_name,
            });
        }

        Ok(Self {
            texts,
            meta,
            matrix,
            dimension,
        })
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Embedding dimensionality, zero for an empty index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn text(&self, position: usize) -> Option<&str> {
        self.texts.get(position).map(String::as_str)
    }

    pub fn meta(&self, position: usize) -> Option<&DocumentMeta> {
        self.meta.get(position)
    }

    /// Normalized embedding row of a document
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.matrix[start..start + self.dimension])
    }

    /// Rank documents against a query vector and keep the best `k`.
    ///
    /// Ties keep index order. An empty index yields no hits for any query;
    /// otherwise a query whose length differs from the index dimensionality
    /// is [`RetrievalError::IndexIncompatible`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(RetrievalError::IndexIncompatible {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let mut hits: Vec<Hit> = self
            .matrix
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| Hit {
                position,
                similarity: dot(row, &query),
            })
            .collect();

        // sort_by is stable, so equal similarities keep document order
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k);
        Ok(hits)
    }

    /// Texts of the top `k` documents for a query vector.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<String>> {
        Ok(self
            .search(query, k)?
            .into_iter()
            .map(|hit| self.texts[hit.position].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(text: &str, embedding: Vec<f32>) -> Document {
        Document {
            doc_type: DocType::Column,
            table_name: "t".to_string(),
            column_name: Some(text.to_string()),
            text: text.to_string(),
            embedding,
        }
    }

    fn abc_index() -> VectorIndex {
        VectorIndex::build(vec![
            document("A", vec![1.0, 0.0, 0.0]),
            document("B", vec![0.0, 3.0, 4.0]),
            document("C", vec![1.0, 1.0, 0.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rows_are_unit_length() {
        let index = abc_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 3);

        for position in 0..index.len() {
            let row = index.row(position).unwrap();
            let norm = dot(row, row).sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "row {position} has norm {norm}");
        }
        assert!(index.row(3).is_none());
    }

    #[test]
    fn test_identical_query_ranks_first_with_similarity_one() {
        let index = abc_index();

        // Same direction as B, different magnitude
        let hits = index.search(&[0.0, 0.6, 0.8], 3).unwrap();
        assert_eq!(hits[0].position, 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-5);
        assert_eq!(index.query(&[0.0, 6.0, 8.0], 1).unwrap(), vec!["B"]);
    }

    #[test]
    fn test_ranking_is_descending() {
        let index = abc_index();

        let hits = index.search(&[1.0, 0.1, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(order, vec![0, 2, 1]);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_ties_keep_document_order() {
        let index = VectorIndex::build(vec![
            document("first", vec![1.0, 0.0]),
            document("second", vec![2.0, 0.0]),
            document("other", vec![0.0, 1.0]),
            document("third", vec![5.0, 0.0]),
        ])
        .unwrap();

        assert_eq!(
            index.query(&[1.0, 0.0], 3).unwrap(),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_k_larger_than_corpus_returns_all() {
        let index = abc_index();
        assert_eq!(index.query(&[0.0, 0.0, 1.0], 10).unwrap().len(), 3);
        assert!(index.query(&[0.0, 0.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::build(vec![]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 0);

        for k in [0, 1, 5, 100] {
            assert!(index.query(&[1.0, 2.0, 3.0], k).unwrap().is_empty());
            assert!(index.query(&[], k).unwrap().is_empty());
        }
    }

    #[test]
    fn test_dimension_mismatch_is_incompatible() {
        let index = abc_index();
        let err = index.query(&[1.0, 0.0], 1).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::IndexIncompatible {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_ragged_documents_are_rejected() {
        let err = VectorIndex::build(vec![
            document("A", vec![1.0, 0.0]),
            document("B", vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::IndexIncompatible {
                expected: 2,
                actual: 3
            }
        ));

        let err = VectorIndex::build(vec![document("A", vec![])]).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::EmbeddingUnavailable {
                operation: "build_index",
                ..
            }
        ));
        assert!(err.to_string().contains("zero-dimensional embeddings"));
    }

    #[test]
    fn test_zero_vectors_stay_finite() {
        let mut zero = vec![0.0f32; 4];
        normalize(&mut zero);
        assert!(zero.iter().all(|x| *x == 0.0));

        let index = VectorIndex::build(vec![
            document("zero", vec![0.0, 0.0]),
            document("x", vec![1.0, 0.0]),
        ])
        .unwrap();
        let hits = index.search(&[0.0, 0.0], 2).unwrap();
        assert!(hits.iter().all(|h| h.similarity == 0.0));
        assert_eq!(index.query(&[1.0, 0.0], 1).unwrap(), vec!["x"]);
    }

    #[test]
    fn test_metadata_is_aligned_with_texts() {
        let index = VectorIndex::build(vec![
            Document {
                doc_type: DocType::Table,
                table_name: "users".to_string(),
                column_name: None,
                text: "Table users: columns = [id]".to_string(),
                embedding: vec![1.0, 0.0],
            },
            Document {
                doc_type: DocType::Column,
                table_name: "users".to_string(),
                column_name: Some("id".to_string()),
                text: "Column users.id: type=INTEGER".to_string(),
                embedding: vec![0.0, 1.0],
            },
        ])
        .unwrap();

        assert_eq!(index.text(1), Some("Column users.id: type=INTEGER"));
        assert_eq!(index.meta(1).unwrap().column_name.as_deref(), Some("id"));
        assert_eq!(index.meta(0).unwrap().doc_type, DocType::Table);
        assert!(index.meta(2).is_none());
    }
}
