//! Shared handles for a build run or a chat session
//!
//! One `RagContext` is built up front and lent to the index builder and the
//! retrieval engine. Tests construct it from fakes.

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::embedding::{Embedder, EmbeddingEngine};
use crate::errors::{RagError, Result};
use crate::vector_store::{QdrantStore, VectorStore};

/// Name of the collection holding bid embeddings
pub const COLLECTION_NAME: &str = "bidding";

/// Embedding capability, vector store and collection name
#[derive(Clone)]
pub struct RagContext {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl RagContext {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            collection: COLLECTION_NAME.to_string(),
        }
    }

    /// Use a different collection name (tests, side-by-side indexes)
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Load the embedding model and connect to Qdrant
    ///
    /// The model load is CPU and disk bound, so it runs on the blocking pool.
    pub async fn load(config: &Config) -> Result<Self> {
        let model_id = config.embedding.model_id.clone();
        let engine = tokio::task::spawn_blocking(move || EmbeddingEngine::new(&model_id))
            .await
            .map_err(|e| RagError::Initialization(format!("model loader panicked: {}", e)))?
            .map_err(|e| RagError::Initialization(format!("{:#}", e)))?;

        let store = QdrantStore::connect(&config.qdrant.url)?;

        Ok(Self::new(Arc::new(engine), Arc::new(store)))
    }

    /// Fail with `Initialization` unless the collection exists
    ///
    /// Returns the number of indexed entries.
    pub async fn require_index(&self) -> Result<u64> {
        let count = self.store
            .count(&self.collection)
            .await
            .map_err(|e| RagError::Initialization(e.to_string()))?;

        match count {
            Some(count) => {
                info!(collection = %self.collection, entries = count, "index ready");
                Ok(count)
            }
            None => Err(RagError::Initialization(format!(
                "collection '{}' not found",
                self.collection
            ))),
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}
