//! Document synthesis, the in-memory vector index and the service tying them together.

pub mod service;
pub mod synthesizer;
pub mod vector_index;

pub use service::{IndexStats, RebuildReport, RetrievalService, ServiceState};
pub use synthesizer::{DraftDocument, synthesize};
pub use vector_index::{Hit, VectorIndex};
