//! End-to-end query handling over an in-memory index

mod common;

use bidrag::context::RagContext;
use bidrag::errors::RagError;
use bidrag::index::IndexBuilder;
use bidrag::rag::{format_result_line, BidAssistant, PromptMode, RetrievalEngine, MAX_RESULTS};
use bidrag::vector_store::InMemoryStore;
use common::{record, road_corpus, KeywordEmbedder, ScriptedGenerator};
use std::sync::Arc;

async fn road_context() -> RagContext {
    let context = RagContext::new(Arc::new(KeywordEmbedder), Arc::new(InMemoryStore::new()));
    IndexBuilder::new(&context)
        .with_progress(false)
        .build(&road_corpus())
        .await
        .unwrap();
    context
}

#[tokio::test]
async fn test_road_query_is_analytical() {
    let context = road_context().await;
    let generator = ScriptedGenerator::new(&["광역 지자체가 ", "발주한 도로 공사입니다."]);
    let assistant = BidAssistant::new(&context, &generator);

    let prepared = assistant.prepare("도로 공사").await.unwrap();
    assert_eq!(prepared.mode, PromptMode::Analytical);
    assert_eq!(prepared.results.len(), 5);
    assert!(prepared.prompt.contains("도로 공사"));
    for hit in prepared.results.iter() {
        assert!(prepared.prompt.contains(&format_result_line(hit)));
    }

    let answer = assistant
        .respond(&prepared)
        .await
        .unwrap()
        .collect_text()
        .await
        .unwrap();
    assert_eq!(answer, "광역 지자체가 발주한 도로 공사입니다.");
    assert_eq!(generator.prompts(), vec![prepared.prompt.clone()]);

    assert_eq!(prepared.results.total_awarded_amount(), 2_792_500_000);
    assert_eq!(prepared.results.average_awarded_amount(), Some(558_500_000));
}

#[tokio::test]
async fn test_equal_scores_keep_corpus_order() {
    let context = road_context().await;
    let results = RetrievalEngine::new(&context).search("도로 공사").await.unwrap();

    let ids: Vec<&str> = results.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_results_are_capped() {
    let context = RagContext::new(Arc::new(KeywordEmbedder), Arc::new(InMemoryStore::new()));
    let mut records: Vec<_> = (0..8)
        .map(|i| record(&format!("교량 보강공사 {}", i), "국토교통부", 100))
        .collect();
    records.push(record("학교 급식 납품", "서울특별시교육청", 100));
    IndexBuilder::new(&context)
        .with_progress(false)
        .build(&bidrag::corpus::Corpus::from_records(records))
        .await
        .unwrap();

    let results = RetrievalEngine::new(&context).search("교량").await.unwrap();
    assert_eq!(results.len(), MAX_RESULTS);
    assert!(results.iter().all(|h| h.metadata.title.starts_with("교량")));
}

#[tokio::test]
async fn test_greeting_keyword_with_matches_is_analytical() {
    let context = road_context().await;
    let generator = ScriptedGenerator::new(&["요약"]);
    let assistant = BidAssistant::new(&context, &generator);

    let prepared = assistant.prepare("안녕, 도로 공사 알려줘").await.unwrap();
    assert_eq!(prepared.mode, PromptMode::Analytical);
}

#[tokio::test]
async fn test_greeting_and_no_results_modes() {
    let context = road_context().await;
    let generator = ScriptedGenerator::new(&["안녕하세요"]);
    let assistant = BidAssistant::new(&context, &generator);

    let greeting = assistant.prepare("안녕하세요").await.unwrap();
    assert!(greeting.results.is_empty());
    assert_eq!(greeting.mode, PromptMode::Greeting);

    let missing = assistant.prepare("급식 납품").await.unwrap();
    assert_eq!(missing.mode, PromptMode::NoResults);
    assert!(missing.prompt.contains("급식 납품"));
    assert_eq!(missing.results.average_awarded_amount(), None);
}

#[tokio::test]
async fn test_search_without_index_fails() {
    let context = RagContext::new(Arc::new(KeywordEmbedder), Arc::new(InMemoryStore::new()));

    let err = context.require_index().await.unwrap_err();
    assert!(matches!(err, RagError::Initialization(_)));
    assert!(err.is_session_fatal());

    let err = RetrievalEngine::new(&context).search("도로").await.unwrap_err();
    assert!(matches!(err, RagError::RetrievalService(_)));
}
