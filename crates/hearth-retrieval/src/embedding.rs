//! Embedding service trait and the built-in hash embedder.
//!
//! `HashEmbedding` maps text to deterministic unit vectors by hashing word
//! tokens into dimension buckets. It needs no model files, which keeps the
//! retriever usable out of the box; a model-backed implementation can be
//! swapped in behind the same trait.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use hearth_core::error::HearthError;

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors. Used for
/// both ingestion (indexing) and search (query embedding).
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, HearthError>;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Deterministic bag-of-words hash embedder.
///
/// Each lowercased token is hashed into a dimension bucket with a signed
/// contribution, and the accumulated vector is L2-normalized. Identical
/// inputs always produce identical outputs, and texts sharing vocabulary
/// land near each other under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingService for HashEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>, HearthError> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();

            let bucket = (h % self.dimensions as u64) as usize;
            // Use a high bit for the sign so bucket and sign are independent.
            let sign = if h & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        // L2-normalize to unit length so cosine reduces to a dot product.
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedding::default();
        let a = embedder.embed("the quick brown fox").unwrap();
        let b = embedder.embed("the quick brown fox").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dimensions() {
        let embedder = HashEmbedding::new(128);
        assert_eq!(embedder.dimensions(), 128);
        assert_eq!(embedder.embed("hello world").unwrap().len(), 128);
    }

    #[test]
    fn test_unit_norm() {
        let embedder = HashEmbedding::default();
        let v = embedder.embed("some sample text for normalization").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedding::default();
        let v = embedder.embed("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let embedder = HashEmbedding::default();
        let query = embedder.embed("rust borrow checker errors").unwrap();
        let related = embedder
            .embed("fixing borrow checker errors in rust")
            .unwrap();
        let unrelated = embedder.embed("banana bread recipe with walnuts").unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_case_insensitive_tokens() {
        let embedder = HashEmbedding::default();
        let a = embedder.embed("Hello World").unwrap();
        let b = embedder.embed("hello world").unwrap();
        assert_eq!(a, b);
    }
}
