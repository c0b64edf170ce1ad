//! Vector store capability
//!
//! The core talks to the store in cosine-*distance* terms: `nearest` returns
//! neighbours sorted by ascending distance. Adapters for engines that report
//! similarity scores convert before returning.

pub mod memory;
pub mod qdrant;

pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

use async_trait::async_trait;

use crate::corpus::BidMetadata;
use crate::errors::Result;

/// One persisted entry of the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Stringified original corpus position
    pub id: String,
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: BidMetadata,
}

/// A search candidate as returned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    pub metadata: BidMetadata,
    /// Cosine distance, `1 - similarity`
    pub distance: f32,
}

/// Outcome of making sure a collection does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A previous collection was dropped
    Removed,
    /// Nothing to drop
    Absent,
}

/// Nearest-neighbour search plus persisted metadata
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop the collection if it exists; absence is a normal outcome
    async fn ensure_absent(&self, collection: &str) -> Result<Removal>;

    /// Create an empty cosine-distance collection
    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<()>;

    /// Write a batch of entries
    async fn upsert(&self, collection: &str, entries: Vec<IndexEntry>) -> Result<()>;

    /// Up to `limit` neighbours, ascending distance
    async fn nearest(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<Neighbor>>;

    /// Number of entries, or `None` when the collection does not exist
    async fn count(&self, collection: &str) -> Result<Option<u64>>;
}
