//! Incremental decoder for newline-delimited generation chunks
//!
//! Network reads do not line up with chunk boundaries, so bytes are buffered
//! until a full line is available. Each line is decoded on its own; a line
//! that fails to decode is reported as an error for that line only.

use serde::Deserialize;

use crate::errors::{RagError, Result};

/// Maximum buffered bytes for a single line (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// One streamed generation chunk
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateChunk {
    /// Text fragment, absent on some control chunks
    #[serde(default)]
    pub response: Option<String>,

    /// Set on the final chunk
    #[serde(default)]
    pub done: bool,

    /// Server-side failure reported in-band
    #[serde(default)]
    pub error: Option<String>,
}

/// Decode a single line into a chunk
///
/// An in-band `error` field is surfaced as a generation error.
pub fn decode_chunk(line: &[u8]) -> Result<GenerateChunk> {
    let chunk: GenerateChunk = serde_json::from_slice(line).map_err(|e| {
        RagError::GenerationService(format!(
            "malformed chunk ({}): {}",
            e,
            String::from_utf8_lossy(line).chars().take(80).collect::<String>()
        ))
    })?;

    if let Some(message) = &chunk.error {
        return Err(RagError::GenerationService(format!("server reported: {}", message)));
    }

    Ok(chunk)
}

/// Line-buffering chunk decoder
#[derive(Debug)]
pub struct ChunkDecoder {
    /// Accumulation buffer
    buffer: Vec<u8>,

    /// Maximum buffer size
    max_buffer_size: usize,
}

impl ChunkDecoder {
    /// Create new decoder with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    /// Create decoder with custom buffer capacity
    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_buffer_size,
        }
    }

    /// Append bytes read from the connection
    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        if self.buffer.len() + bytes.len() > self.max_buffer_size {
            return Err(RagError::GenerationService(format!(
                "Buffer overflow: {} bytes exceeds maximum {}",
                self.buffer.len() + bytes.len(),
                self.max_buffer_size
            )));
        }

        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Decode the next complete line, skipping blank ones
    ///
    /// Returns `None` when no complete line is buffered yet.
    pub fn next_chunk(&mut self) -> Option<Result<GenerateChunk>> {
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(result) = Self::decode_line(&line) {
                return Some(result);
            }
        }
        None
    }

    /// Decode whatever is left once the connection has closed
    pub fn finish(&mut self) -> Option<Result<GenerateChunk>> {
        if let Some(result) = self.next_chunk() {
            return Some(result);
        }
        let rest = std::mem::take(&mut self.buffer);
        Self::decode_line(&rest)
    }

    fn decode_line(line: &[u8]) -> Option<Result<GenerateChunk>> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return None;
        }
        Some(decode_chunk(trimmed))
    }

    /// Get current buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}
