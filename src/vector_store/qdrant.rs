// Qdrant-backed vector store
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, CountPointsBuilder, CreateCollectionBuilder, Distance,
    PointId, PointStruct, ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tracing::debug;

use super::{IndexEntry, Neighbor, Removal, VectorStore};
use crate::corpus::BidMetadata;
use crate::errors::{RagError, Result};

/// Default Qdrant gRPC endpoint
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Payload key holding the document text
const DOCUMENT_KEY: &str = "document";

/// Vector store backed by a Qdrant server
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Build a client; no request is made until the first call
    pub fn connect(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| RagError::Initialization(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn service_error(context: &str, err: impl std::fmt::Display) -> RagError {
    RagError::RetrievalService(format!("{}: {}", context, err))
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_absent(&self, collection: &str) -> Result<Removal> {
        let exists = self.client
            .collection_exists(collection)
            .await
            .map_err(|e| service_error("Failed to check collection", e))?;

        if !exists {
            return Ok(Removal::Absent);
        }

        self.client
            .delete_collection(collection)
            .await
            .map_err(|e| service_error("Failed to delete collection", e))?;

        Ok(Removal::Removed)
    }

    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| service_error(&format!("Failed to create collection: {}", collection), e))?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let points = entries
            .into_iter()
            .map(entry_to_point)
            .collect::<Result<Vec<_>>>()?;

        debug!(collection, points = points.len(), "upserting points");

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| service_error("Failed to batch upsert points", e))?;

        Ok(())
    }

    async fn nearest(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<Neighbor>> {
        let search_result = self.client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(true),
            )
            .await
            .map_err(|e| service_error("Failed to search points", e))?;

        // Qdrant reports cosine similarity, best first
        Ok(search_result.result.into_iter().map(point_to_neighbor).collect())
    }

    async fn count(&self, collection: &str) -> Result<Option<u64>> {
        let exists = self.client
            .collection_exists(collection)
            .await
            .map_err(|e| service_error("Failed to check collection", e))?;

        if !exists {
            return Ok(None);
        }

        let response = self.client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| service_error("Failed to count points", e))?;

        Ok(Some(response.result.map(|r| r.count).unwrap_or(0)))
    }
}

fn entry_to_point(entry: IndexEntry) -> Result<PointStruct> {
    let id: u64 = entry.id.parse().map_err(|_| {
        RagError::RetrievalService(format!("entry id '{}' is not a corpus position", entry.id))
    })?;

    Ok(PointStruct::new(id, entry.vector, metadata_to_payload(&entry.metadata, entry.document)))
}

fn metadata_to_payload(metadata: &BidMetadata, document: String) -> HashMap<String, QdrantValue> {
    let mut payload: HashMap<String, QdrantValue> = metadata
        .fields()
        .into_iter()
        .map(|(key, value)| (key.to_string(), QdrantValue::from(value.to_string())))
        .collect();
    payload.insert(DOCUMENT_KEY.to_string(), QdrantValue::from(document));
    payload
}

fn payload_to_metadata(payload: &HashMap<String, QdrantValue>) -> BidMetadata {
    BidMetadata::from_lookup(|key| payload.get(key).and_then(qdrant_value_as_str))
}

fn point_to_neighbor(point: ScoredPoint) -> Neighbor {
    Neighbor {
        id: point_id_to_string(&point.id),
        metadata: payload_to_metadata(&point.payload),
        distance: 1.0 - point.score,
    }
}

fn qdrant_value_as_str(value: &QdrantValue) -> Option<&str> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.as_str()),
        _ => None,
    }
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    point_id.as_ref().map(|id| {
        match &id.point_id_options {
            Some(PointIdOptions::Num(n)) => n.to_string(),
            Some(PointIdOptions::Uuid(u)) => u.clone(),
            None => "unknown".to_string(),
        }
    }).unwrap_or_else(|| "unknown".to_string())
}
