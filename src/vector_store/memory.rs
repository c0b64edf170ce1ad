//! Brute-force in-process store
//!
//! Used for tests and small corpora. Search is a linear cosine scan; ties
//! keep insertion order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{IndexEntry, Neighbor, Removal, VectorStore};
use crate::errors::{RagError, Result};

#[derive(Debug, Default)]
struct Collection {
    dimension: usize,
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

/// In-memory vector store keyed by collection name
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of a collection in insertion order
    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.with_collections(|collections| {
            collections
                .get(collection)
                .map(|c| c.entries.iter().map(|e| e.id.clone()).collect())
                .unwrap_or_default()
        })
    }

    /// Copy of all entries of a collection
    pub fn entries(&self, collection: &str) -> Vec<IndexEntry> {
        self.with_collections(|collections| {
            collections
                .get(collection)
                .map(|c| c.entries.clone())
                .unwrap_or_default()
        })
    }

    fn with_collections<T>(&self, f: impl FnOnce(&mut HashMap<String, Collection>) -> T) -> T {
        let mut guard = self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

/// Cosine similarity between two vectors; 0 when either is all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        dot_product / (magnitude_a * magnitude_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn ensure_absent(&self, collection: &str) -> Result<Removal> {
        Ok(self.with_collections(|collections| match collections.remove(collection) {
            Some(_) => Removal::Removed,
            None => Removal::Absent,
        }))
    }

    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        self.with_collections(|collections| {
            if collections.contains_key(collection) {
                return Err(RagError::RetrievalService(format!(
                    "collection '{}' already exists",
                    collection
                )));
            }
            collections.insert(
                collection.to_string(),
                Collection {
                    dimension,
                    ..Default::default()
                },
            );
            Ok(())
        })
    }

    async fn upsert(&self, collection: &str, entries: Vec<IndexEntry>) -> Result<()> {
        self.with_collections(|collections| {
            let target = collections.get_mut(collection).ok_or_else(|| {
                RagError::RetrievalService(format!("collection '{}' not found", collection))
            })?;

            for entry in entries {
                if entry.vector.len() != target.dimension {
                    return Err(RagError::DimensionMismatch {
                        expected: target.dimension,
                        actual: entry.vector.len(),
                    });
                }
                match target.positions.get(&entry.id) {
                    Some(&position) => target.entries[position] = entry,
                    None => {
                        target.positions.insert(entry.id.clone(), target.entries.len());
                        target.entries.push(entry);
                    }
                }
            }
            Ok(())
        })
    }

    async fn nearest(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<Neighbor>> {
        self.with_collections(|collections| {
            let target = collections.get(collection).ok_or_else(|| {
                RagError::RetrievalService(format!("collection '{}' not found", collection))
            })?;
            if vector.len() != target.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: target.dimension,
                    actual: vector.len(),
                });
            }

            let mut neighbors: Vec<Neighbor> = target
                .entries
                .iter()
                .map(|entry| Neighbor {
                    id: entry.id.clone(),
                    metadata: entry.metadata.clone(),
                    distance: 1.0 - cosine_similarity(vector, &entry.vector),
                })
                .collect();

            // stable: equal distances keep insertion order
            neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            neighbors.truncate(limit);
            Ok(neighbors)
        })
    }

    async fn count(&self, collection: &str) -> Result<Option<u64>> {
        Ok(self.with_collections(|collections| {
            collections.get(collection).map(|c| c.entries.len() as u64)
        }))
    }
}
