//! Lazy sequence of generated text fragments

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

use super::parser::ChunkDecoder;
use crate::errors::Result;

/// Raw response body as delivered by the transport
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Fragments of one generation, consumed once
///
/// Ends at the first chunk flagged `done` (after yielding its text) or when
/// the body ends. A transport or decode error is yielded once and ends the
/// stream.
pub struct ResponseStream {
    body: ByteStream,
    decoder: ChunkDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl std::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("decoder", &self.decoder)
            .field("pending", &self.pending)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ResponseStream {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: ChunkDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Stream over an in-memory body, split into the given reads
    pub fn from_reads<I>(reads: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let reads: Vec<Result<Bytes>> = reads.into_iter().map(|r| Ok(r.into())).collect();
        Self::new(stream::iter(reads).boxed())
    }

    /// Next fragment, `None` once the generation is complete
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Some(Ok(fragment));
            }
            if self.finished {
                return None;
            }

            if let Some(decoded) = self.decoder.next_chunk() {
                match decoded {
                    Ok(chunk) => {
                        self.accept(chunk.response, chunk.done);
                        continue;
                    }
                    Err(e) => return Some(self.fail(e)),
                }
            }

            match self.body.next().await {
                Some(Ok(bytes)) => {
                    if let Err(e) = self.decoder.push(&bytes) {
                        return Some(self.fail(e));
                    }
                }
                Some(Err(e)) => return Some(self.fail(e)),
                None => {
                    debug!("generation body closed");
                    self.finished = true;
                    match self.decoder.finish() {
                        Some(Ok(chunk)) => self.accept(chunk.response, chunk.done),
                        Some(Err(e)) => return Some(self.fail(e)),
                        None => {}
                    }
                }
            }
        }
    }

    /// Consume the whole generation into one string
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next_fragment().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    /// Adapt into a `futures` stream
    pub fn into_stream(self) -> impl Stream<Item = Result<String>> {
        stream::unfold(self, |mut response| async move {
            response
                .next_fragment()
                .await
                .map(|item| (item, response))
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished && self.pending.is_empty()
    }

    fn accept(&mut self, fragment: Option<String>, done: bool) {
        if let Some(text) = fragment.filter(|t| !t.is_empty()) {
            self.pending.push_back(text);
        }
        if done {
            debug!("generation done");
            self.finished = true;
        }
    }

    fn fail<T>(&mut self, err: crate::errors::RagError) -> Result<T> {
        self.finished = true;
        self.pending.clear();
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagError;

    fn line(text: &str, done: bool) -> String {
        format!("{}\n", serde_json::json!({ "response": text, "done": done }))
    }

    #[tokio::test]
    async fn test_fragments_in_order() {
        let body = vec![line("서울시 ", false), line("도로 ", false), line("사업입니다.", true)];
        let text = ResponseStream::from_reads(body).collect_text().await.unwrap();
        assert_eq!(text, "서울시 도로 사업입니다.");
    }

    #[tokio::test]
    async fn test_stops_at_first_done_chunk() {
        let body = vec![line("끝", true), line("무시", false), "garbage\n".to_string()];
        let mut response = ResponseStream::from_reads(body);

        assert_eq!(response.next_fragment().await.unwrap().unwrap(), "끝");
        assert!(response.next_fragment().await.is_none());
        assert!(response.is_finished());
    }

    #[tokio::test]
    async fn test_chunk_split_across_reads() {
        let whole = line("분할된 응답", true);
        let (head, tail) = whole.as_bytes().split_at(10);
        let response = ResponseStream::from_reads(vec![head.to_vec(), tail.to_vec()]);
        assert_eq!(response.collect_text().await.unwrap(), "분할된 응답");
    }

    #[tokio::test]
    async fn test_closed_connection_without_done() {
        let response = ResponseStream::from_reads(vec![line("부분", false)]);
        assert_eq!(response.collect_text().await.unwrap(), "부분");
    }

    #[tokio::test]
    async fn test_empty_fragments_are_skipped() {
        let mut response = ResponseStream::from_reads(vec![
            "{\"done\":false}\n".to_string(),
            line("", false),
            line("a", true),
        ]);
        assert_eq!(response.next_fragment().await.unwrap().unwrap(), "a");
        assert!(response.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_chunk_ends_stream_with_error() {
        let mut response = ResponseStream::from_reads(vec![
            line("앞부분", false),
            "{not json}\n".to_string(),
            line("뒷부분", true),
        ]);

        assert_eq!(response.next_fragment().await.unwrap().unwrap(), "앞부분");
        let err = response.next_fragment().await.unwrap().unwrap_err();
        assert!(matches!(err, RagError::GenerationService(_)));
        assert!(response.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let body: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from(line("a", false))),
            Err(RagError::GenerationService("connection reset".to_string())),
        ];
        let mut response = ResponseStream::new(stream::iter(body).boxed());

        assert_eq!(response.next_fragment().await.unwrap().unwrap(), "a");
        assert!(response.next_fragment().await.unwrap().is_err());
        assert!(response.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn test_into_stream() {
        let response = ResponseStream::from_reads(vec![line("x", false), line("y", true)]);
        let fragments: Vec<String> = response
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["x", "y"]);
    }
}
