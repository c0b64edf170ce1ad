//! Corpus loading
//!
//! The corpus is the JSON array written by the collector. Record order is
//! significant: a record's position becomes its identifier in the index.

pub mod record;

pub use record::{BidMetadata, Record, DOCUMENT_SEPARATOR};

use std::fs;
use std::path::Path;
use tracing::info;

use crate::errors::{RagError, Result};

/// Default corpus location, relative to the working directory
pub const DEFAULT_CORPUS_PATH: &str = "data/bidding.json";

/// Ordered, immutable sequence of bid records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    records: Vec<Record>,
}

impl Corpus {
    /// Wrap records already in memory
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load the corpus file
    ///
    /// A missing file is reported as `CorpusMissing`; an empty array loads
    /// fine and is rejected later by the index builder.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RagError::CorpusMissing(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let records: Vec<Record> = serde_json::from_str(&contents)?;
        info!(path = %path.display(), records = records.len(), "loaded corpus");

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records paired with their original position
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records.iter().enumerate()
    }
}
