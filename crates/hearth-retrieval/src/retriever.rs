//! The retrieval contract and its SQLite-backed implementation.
//!
//! The orchestrator depends on `Retriever` only. `retrieve` and
//! `add_document` never propagate failures: retrieval degrades to an empty
//! result and indexing degrades to a logged no-op, so a broken vector store
//! can never fail a chat turn.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use hearth_storage::{Database, DocumentRepository};

use crate::embedding::EmbeddingService;

/// One ranked context passage returned by retrieval.
#[derive(Debug, Clone)]
pub struct Passage {
    pub content: String,
    /// Cosine similarity against the query, in [-1, 1].
    pub score: f32,
    /// Metadata attached when the document was indexed.
    pub metadata: serde_json::Value,
}

/// Contract for the context retrieval subsystem.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Whether the backing resources were successfully acquired at startup.
    /// Never throws; an uninitialized retriever returns empty results.
    fn is_initialized(&self) -> bool;

    /// Return up to `k` passages ranked by relevance to `query`.
    /// Returns an empty vec on any internal failure.
    async fn retrieve(&self, query: &str, k: usize) -> Vec<Passage>;

    /// Index a document for future retrieval. Best-effort: silently no-ops
    /// on empty text or uninitialized state; failures are logged.
    async fn add_document(&self, content: &str, metadata: serde_json::Value);
}

/// Local vector store: embeddings persisted in SQLite, brute-force cosine
/// ranking at query time.
///
/// Constructed once at process start and injected into the orchestrator;
/// the `initialized` status is fixed at construction time.
pub struct VectorRetriever {
    documents: DocumentRepository,
    embedder: Box<dyn EmbeddingService>,
    initialized: bool,
}

impl VectorRetriever {
    /// Build a retriever over the given database.
    ///
    /// Probes the document table once; if the probe or the embedder is
    /// unusable the retriever is constructed in the uninitialized state
    /// rather than failing startup.
    pub fn new(db: Arc<Database>, embedder: impl EmbeddingService + 'static) -> Self {
        let documents = DocumentRepository::new(db);
        let initialized = match documents.count() {
            Ok(count) => {
                debug!(documents = count, "Vector store ready");
                true
            }
            Err(e) => {
                warn!("Vector store unavailable: {}", e);
                false
            }
        };

        Self {
            documents,
            embedder: Box::new(embedder),
            initialized,
        }
    }

    /// Build a permanently uninitialized retriever (retrieval disabled in
    /// config). Every turn then takes the no-context branch.
    pub fn disabled(db: Arc<Database>, embedder: impl EmbeddingService + 'static) -> Self {
        Self {
            documents: DocumentRepository::new(db),
            embedder: Box::new(embedder),
            initialized: false,
        }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn retrieve(&self, query: &str, k: usize) -> Vec<Passage> {
        if !self.initialized || query.trim().is_empty() || k == 0 {
            return Vec::new();
        }

        let query_vec = match self.embedder.embed(query) {
            Ok(v) => v,
            Err(e) => {
                warn!("Query embedding failed: {}", e);
                return Vec::new();
            }
        };

        let docs = match self.documents.all() {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Vector store read failed: {}", e);
                return Vec::new();
            }
        };

        let mut scored: Vec<Passage> = docs
            .into_iter()
            .filter(|doc| doc.embedding.len() == query_vec.len())
            .map(|doc| Passage {
                score: cosine_similarity(&query_vec, &doc.embedding),
                content: doc.content,
                metadata: doc.metadata,
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    async fn add_document(&self, content: &str, metadata: serde_json::Value) {
        if !self.initialized || content.trim().is_empty() {
            return;
        }

        let embedding = match self.embedder.embed(content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Document embedding failed: {}", e);
                return;
            }
        };

        let id = Uuid::new_v4();
        match self
            .documents
            .insert(id, content.trim(), &metadata, &embedding, Utc::now())
        {
            Ok(()) => debug!(%id, "Document indexed"),
            Err(e) => warn!("Failed to index document: {}", e),
        }
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// Inputs from `HashEmbedding` are unit vectors, but stored documents may
/// come from another embedder, so the norms are not assumed.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
