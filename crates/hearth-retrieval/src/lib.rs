//! Context retrieval for Hearth.
//!
//! Provides the `Retriever` contract used by the orchestrator to augment
//! prompts, and `VectorRetriever`, a local vector store over SQLite with a
//! pluggable embedding service. Retrieval never fails the caller: every
//! internal error degrades to an empty result or a silent no-op.

pub mod embedding;
pub mod retriever;

pub use embedding::{EmbeddingService, HashEmbedding};
pub use retriever::{Passage, Retriever, VectorRetriever};
