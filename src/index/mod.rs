//! Index construction
//!
//! Turns a corpus into the persisted `bidding` collection. A build always
//! replaces the previous collection; it never merges into it.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::context::RagContext;
use crate::corpus::{BidMetadata, Corpus};
use crate::embedding::{check_dimension, Embedder};
use crate::errors::{RagError, Result};
use crate::vector_store::{IndexEntry, Removal, VectorStore};

/// Documents per embedding call
pub const EMBED_BATCH_SIZE: usize = 32;

/// Entries per vector-store write
pub const WRITE_BATCH_SIZE: usize = 5000;

/// A corpus record that survived document derivation
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocument {
    /// Original corpus position, stringified
    pub id: String,
    pub text: String,
    pub metadata: BidMetadata,
}

/// Derive documents, skipping records with no text
///
/// Skipped positions are not reused, so identifiers may have gaps.
pub fn prepare_documents(corpus: &Corpus) -> Vec<PreparedDocument> {
    corpus
        .iter()
        .filter_map(|(position, record)| {
            let text = record.document();
            if text.is_empty() {
                debug!(position, "skipping record without title or organization");
                return None;
            }
            Some(PreparedDocument {
                id: position.to_string(),
                text,
                metadata: record.metadata(),
            })
        })
        .collect()
}

/// Summary of a finished build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub corpus_size: usize,
    pub indexed: usize,
    pub skipped: usize,
    /// Outcome of dropping the previous collection
    pub previous: Removal,
    pub elapsed: Duration,
}

/// Builds the vector index from a corpus
pub struct IndexBuilder<'a> {
    context: &'a RagContext,
    show_progress: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(context: &'a RagContext) -> Self {
        Self {
            context,
            show_progress: true,
        }
    }

    /// Enable or disable the terminal progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Embed the corpus and replace the collection with the result
    ///
    /// Embedding runs before the old collection is dropped, so an embedding
    /// failure leaves the previous index untouched.
    pub async fn build(&self, corpus: &Corpus) -> Result<BuildReport> {
        if corpus.is_empty() {
            return Err(RagError::CorpusMissing("corpus contains no records".to_string()));
        }

        let started = Instant::now();
        let documents = prepare_documents(corpus);
        let skipped = corpus.len() - documents.len();
        info!(records = corpus.len(), documents = documents.len(), skipped, "prepared documents");

        let progress = self.progress_bar(documents.len() as u64);
        let vectors = self.embed_all(&documents, &progress).await?;

        let collection = self.context.collection();
        let store = self.context.store();

        let previous = store.ensure_absent(collection).await?;
        match previous {
            Removal::Removed => info!(collection, "dropped previous collection"),
            Removal::Absent => debug!(collection, "no previous collection"),
        }

        store
            .create_collection(collection, self.context.embedder().dimension())
            .await?;

        let entries: Vec<IndexEntry> = documents
            .into_iter()
            .zip(vectors)
            .map(|(doc, vector)| IndexEntry {
                id: doc.id,
                vector,
                document: doc.text,
                metadata: doc.metadata,
            })
            .collect();
        let indexed = entries.len();

        let mut written = 0;
        let mut remaining = entries.into_iter().peekable();
        while remaining.peek().is_some() {
            let batch: Vec<IndexEntry> = remaining.by_ref().take(WRITE_BATCH_SIZE).collect();
            written += batch.len();
            store.upsert(collection, batch).await?;
            info!(collection, written, total = indexed, "stored batch");
        }

        Ok(BuildReport {
            corpus_size: corpus.len(),
            indexed,
            skipped,
            previous,
            elapsed: started.elapsed(),
        })
    }

    /// Embed every document, leaving the bar cleared on success and abandoned on failure
    async fn embed_all(
        &self,
        documents: &[PreparedDocument],
        progress: &ProgressBar,
    ) -> Result<Vec<Vec<f32>>> {
        let outcome = self.embed_batches(documents, progress).await;
        match outcome {
            Ok(_) => progress.finish_and_clear(),
            Err(_) => progress.abandon(),
        }
        outcome
    }

    async fn embed_batches(
        &self,
        documents: &[PreparedDocument],
        progress: &ProgressBar,
    ) -> Result<Vec<Vec<f32>>> {
        let embedder = self.context.embedder();
        let dimension = embedder.dimension();

        let mut vectors = Vec::with_capacity(documents.len());
        for batch in documents.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|doc| doc.text.clone()).collect();
            let embedded = embedder.embed_batch(&texts).await?;

            if embedded.len() != batch.len() {
                return Err(RagError::RetrievalService(format!(
                    "embedder returned {} vectors for {} documents",
                    embedded.len(),
                    batch.len()
                )));
            }
            for vector in &embedded {
                check_dimension(dimension, vector)?;
            }

            vectors.extend(embedded);
            progress.inc(batch.len() as u64);
        }

        Ok(vectors)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("Embedding [{bar:40.cyan/blue}] {pos}/{len} | ETA: {eta}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    }
}
