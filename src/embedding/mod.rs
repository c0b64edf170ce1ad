//! Embedding capability
//!
//! The pipeline only needs text in, fixed-dimension vectors out. The local
//! candle engine implements it for real runs; tests plug in fakes.

pub mod engine;

pub use engine::{EmbeddingEngine, DEFAULT_MODEL_ID};

use async_trait::async_trait;

use crate::errors::{RagError, Result};

/// Maps text to fixed-dimension vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Vector dimension; constant for the lifetime of the embedder
    fn dimension(&self) -> usize;

    /// Embed a batch, returning one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        let vector = vectors.pop().ok_or_else(|| {
            RagError::RetrievalService("embedder returned no vector".to_string())
        })?;
        check_dimension(self.dimension(), &vector)?;
        Ok(vector)
    }
}

/// Reject vectors whose length differs from the expected dimension
pub fn check_dimension(expected: usize, vector: &[f32]) -> Result<()> {
    if vector.len() != expected {
        return Err(RagError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}
