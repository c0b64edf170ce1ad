//! Streaming generation
//!
//! Ollama client, incremental chunk decoder and the fragment stream handed
//! to the display.

pub mod client;
pub mod parser;
pub mod response;

use async_trait::async_trait;

use crate::errors::Result;

pub use client::{OllamaClient, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_PORT};
pub use parser::{decode_chunk, ChunkDecoder, GenerateChunk, MAX_BUFFER_SIZE};
pub use response::{ByteStream, ResponseStream};

/// Source of streamed completions
#[async_trait]
pub trait Generator: Send + Sync {
    /// Start generating a completion for `prompt`
    async fn stream(&self, prompt: String) -> Result<ResponseStream>;
}

#[async_trait]
impl Generator for OllamaClient {
    async fn stream(&self, prompt: String) -> Result<ResponseStream> {
        self.generate_stream(prompt).await
    }
}
