//! Per-query failures in the chat loop

mod common;

use bidrag::context::RagContext;
use bidrag::errors::RagError;
use bidrag::index::IndexBuilder;
use bidrag::rag::BidAssistant;
use bidrag::repl::{answer_query, DisplayManager};
use bidrag::vector_store::{InMemoryStore, VectorStore};
use common::{road_corpus, KeywordEmbedder, ScriptedGenerator, TruncatedGenerator};
use std::sync::Arc;

async fn road_context(store: Arc<InMemoryStore>) -> RagContext {
    let context = RagContext::new(Arc::new(KeywordEmbedder), store);
    IndexBuilder::new(&context)
        .with_progress(false)
        .build(&road_corpus())
        .await
        .unwrap();
    context
}

#[tokio::test]
async fn test_broken_stream_fails_only_that_query() {
    let context = road_context(Arc::new(InMemoryStore::new())).await;
    let display = DisplayManager::new();

    let broken = TruncatedGenerator;
    let assistant = BidAssistant::new(&context, &broken);
    let err = answer_query(&assistant, &display, "도로 공사").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationService(_)));
    assert!(!err.is_session_fatal());

    let healthy = ScriptedGenerator::new(&["도로 공사 위주입니다."]);
    let assistant = BidAssistant::new(&context, &healthy);
    answer_query(&assistant, &display, "도로 공사").await.unwrap();
    assert_eq!(healthy.prompts().len(), 1);
}

#[tokio::test]
async fn test_store_failure_is_not_session_fatal() {
    let store = Arc::new(InMemoryStore::new());
    let context = road_context(store.clone()).await;
    store.ensure_absent(context.collection()).await.unwrap();

    let generator = ScriptedGenerator::new(&["응답"]);
    let assistant = BidAssistant::new(&context, &generator);
    let err = answer_query(&assistant, &DisplayManager::new(), "도로 공사")
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::RetrievalService(_)));
    assert!(!err.is_session_fatal());
    assert!(generator.prompts().is_empty());
}
