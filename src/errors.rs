//! Error types for bidrag
//!
//! Every variant carries enough context for a one-line report and exposes a
//! remediation hint that the CLI prints underneath it.

use thiserror::Error;

/// Main error type for the retrieval pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Corpus file is absent or holds no records
    #[error("Corpus unavailable: {0}")]
    CorpusMissing(String),

    /// Embedding model or index could not be brought up for a session
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Embedding or vector-store call failed
    #[error("Retrieval service error: {0}")]
    RetrievalService(String),

    /// Generation request failed or a streamed chunk could not be decoded
    #[error("Generation service error: {0}")]
    GenerationService(String),

    /// Query and index vectors disagree on dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// What the user can do about it
    pub fn remediation(&self) -> &'static str {
        match self {
            RagError::CorpusMissing(_) => {
                "Collect bid records into the corpus file first, or pass --corpus <PATH>."
            }
            RagError::Initialization(_) => {
                "Run `bidrag build` first and make sure Qdrant is running (default http://localhost:6334)."
            }
            RagError::RetrievalService(_) => {
                "Check that Qdrant is reachable and the index is built, then try the query again."
            }
            RagError::GenerationService(_) | RagError::Http(_) => {
                "Make sure Ollama is running (`ollama serve`) and the model is pulled, then retry."
            }
            RagError::DimensionMismatch { .. } => {
                "The index was built with a different embedding model. Rebuild it with `bidrag build`."
            }
            RagError::Config(_) => "Fix ~/.bidrag/config.toml or delete it to regenerate defaults.",
            RagError::Serialization(_) | RagError::Io(_) => {
                "Check that the file exists and contains valid JSON."
            }
        }
    }

    /// Errors that end an interactive session instead of a single query
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, RagError::Initialization(_))
    }
}
