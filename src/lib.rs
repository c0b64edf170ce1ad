//! bidrag - retrieval-augmented answers over procurement bid records
//!
//! # Architecture
//!
//! - **corpus**: bid records loaded from the collected JSON file
//! - **index**: embeds the corpus and rebuilds the vector collection
//! - **rag**: retrieval, query classification, prompt synthesis
//! - **streaming**: Ollama generation client and chunk decoder
//! - **repl**: interactive chat loop and terminal output
//!
//! The embedding model and the vector store sit behind the [`embedding::Embedder`]
//! and [`vector_store::VectorStore`] traits; [`context::RagContext`] bundles them.

pub mod errors;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod vector_store;
pub mod context;
pub mod index;
pub mod rag;
pub mod streaming;

// Interface layer
pub mod repl;
pub mod bootstrap;
pub mod cli;

pub use errors::{RagError, Result};
