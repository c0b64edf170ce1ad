//! Similarity search with thresholding and a result cap

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::RagContext;
use crate::corpus::BidMetadata;
use crate::embedding::{check_dimension, Embedder};
use crate::errors::Result;
use crate::vector_store::{Neighbor, VectorStore};

/// Candidates fetched from the store before filtering
pub const TOP_K: usize = 10;

/// Acceptance floor on `1 - distance`
pub const MIN_SIMILARITY: f32 = 0.60;

/// Accepted results kept after filtering
pub const MAX_RESULTS: usize = 5;

/// Search parameters for retrieval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Candidates requested from the store
    pub top_k: usize,
    /// Minimum similarity, inclusive
    pub min_similarity: f32,
    /// Cap on accepted results
    pub max_results: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: TOP_K,
            min_similarity: MIN_SIMILARITY,
            max_results: MAX_RESULTS,
        }
    }
}

/// One accepted search hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBid {
    pub id: String,
    pub metadata: BidMetadata,
    pub distance: f32,
}

impl ScoredBid {
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }

    /// Similarity as a whole percentage
    pub fn similarity_percent(&self) -> i64 {
        (self.similarity() * 100.0).round() as i64
    }
}

/// Accepted hits, most similar first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    hits: Vec<ScoredBid>,
}

impl QueryResult {
    pub fn new(hits: Vec<ScoredBid>) -> Self {
        Self { hits }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn hits(&self) -> &[ScoredBid] {
        &self.hits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredBid> {
        self.hits.iter()
    }

    /// Sum of awarded amounts, saturating at `u64::MAX`
    pub fn total_awarded_amount(&self) -> u64 {
        self.hits
            .iter()
            .fold(0u64, |total, h| total.saturating_add(h.metadata.amount()))
    }

    /// Integer mean of awarded amounts, `None` when empty
    pub fn average_awarded_amount(&self) -> Option<u64> {
        if self.hits.is_empty() {
            return None;
        }
        Some(self.total_awarded_amount() / self.hits.len() as u64)
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a ScoredBid;
    type IntoIter = std::slice::Iter<'a, ScoredBid>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Keep candidates at or above the floor, in store order, up to the cap
///
/// Candidates past the cap are dropped even when they pass the floor.
pub fn select_results(candidates: Vec<Neighbor>, params: &SearchParams) -> QueryResult {
    let hits = candidates
        .into_iter()
        .filter(|n| 1.0 - n.distance >= params.min_similarity)
        .take(params.max_results)
        .map(|n| ScoredBid {
            id: n.id,
            metadata: n.metadata,
            distance: n.distance,
        })
        .collect();
    QueryResult::new(hits)
}

/// Embeds queries and searches the index held by a [`RagContext`]
pub struct RetrievalEngine<'a> {
    context: &'a RagContext,
    params: SearchParams,
}

impl<'a> RetrievalEngine<'a> {
    pub fn new(context: &'a RagContext) -> Self {
        Self::with_params(context, SearchParams::default())
    }

    pub fn with_params(context: &'a RagContext, params: SearchParams) -> Self {
        Self { context, params }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Search for bids similar to `query`
    ///
    /// An empty result is not an error.
    pub async fn search(&self, query: &str) -> Result<QueryResult> {
        let embedder = self.context.embedder();
        let vector = embedder.embed(query).await?;
        check_dimension(embedder.dimension(), &vector)?;

        let candidates = self
            .context
            .store()
            .nearest(self.context.collection(), &vector, self.params.top_k)
            .await?;
        let fetched = candidates.len();

        let result = select_results(candidates, &self.params);
        debug!(fetched, accepted = result.len(), "retrieval complete");
        Ok(result)
    }
}
