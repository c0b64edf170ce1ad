//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bidrag::corpus::{Corpus, Record};
use bidrag::embedding::Embedder;
use bidrag::streaming::{Generator, ResponseStream};
use bidrag::Result;
use std::sync::Mutex;

/// Topic words; a text embeds to how often it mentions each one
pub const TOPICS: [&str; 5] = ["도로", "공사", "챗봇", "교량", "급식"];

#[derive(Debug, Default)]
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dimension(&self) -> usize {
        TOPICS.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                TOPICS
                    .iter()
                    .map(|topic| text.matches(topic).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Replays a fixed answer as NDJSON chunks and records prompts
#[derive(Debug)]
pub struct ScriptedGenerator {
    fragments: Vec<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn stream(&self, prompt: String) -> Result<ResponseStream> {
        self.prompts.lock().unwrap().push(prompt);

        let last = self.fragments.len().saturating_sub(1);
        let lines: Vec<String> = self
            .fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| {
                format!(
                    "{}\n",
                    serde_json::json!({ "response": fragment, "done": i == last })
                )
            })
            .collect();
        Ok(ResponseStream::from_reads(lines))
    }
}

/// Emits one fragment, then a chunk cut off mid-object
#[derive(Debug, Default)]
pub struct TruncatedGenerator;

#[async_trait]
impl Generator for TruncatedGenerator {
    async fn stream(&self, _prompt: String) -> Result<ResponseStream> {
        Ok(ResponseStream::from_reads(vec![
            "{\"response\": \"서울시 \", \"done\": false}\n",
            "{\"response\": \n",
        ]))
    }
}

pub fn record(title: &str, organization: &str, amount: u64) -> Record {
    Record {
        title: title.to_string(),
        organization: organization.to_string(),
        awarded_amount: Some(amount),
        ..Default::default()
    }
}

/// Five city road-construction bids
pub fn road_corpus() -> Corpus {
    Corpus::from_records(vec![
        record("강남대로 도로 포장공사", "서울특별시 강남구", 1_200_000_000),
        record("시도 23호선 도로 확장공사", "경기도 화성시", 850_000_000),
        record("도심 도로 보수공사", "부산광역시", 430_000_000),
        record("도로 배수시설 정비공사", "대구광역시 수성구", 215_500_000),
        record("농어촌 도로 재포장 공사", "전라남도 나주시", 97_000_000),
    ])
}
