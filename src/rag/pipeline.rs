//! End-to-end query handling: retrieve, classify, synthesize, stream

use tracing::info;

use super::classifier::{classify, PromptMode};
use super::prompt::synthesize;
use super::retrieval::{QueryResult, RetrievalEngine};
use crate::context::RagContext;
use crate::errors::Result;
use crate::streaming::{Generator, ResponseStream};

/// Everything decided for a query before generation starts
#[derive(Debug, Clone)]
pub struct PreparedAnswer {
    pub query: String,
    pub results: QueryResult,
    pub mode: PromptMode,
    pub prompt: String,
}

/// Answers bid questions with retrieval-grounded generation
pub struct BidAssistant<'a> {
    retrieval: RetrievalEngine<'a>,
    generator: &'a dyn Generator,
}

impl<'a> BidAssistant<'a> {
    pub fn new(context: &'a RagContext, generator: &'a dyn Generator) -> Self {
        Self::with_retrieval(RetrievalEngine::new(context), generator)
    }

    pub fn with_retrieval(retrieval: RetrievalEngine<'a>, generator: &'a dyn Generator) -> Self {
        Self { retrieval, generator }
    }

    /// Search, classify and build the prompt
    pub async fn prepare(&self, query: &str) -> Result<PreparedAnswer> {
        let results = self.retrieval.search(query).await?;
        let mode = classify(query, &results);
        let prompt = synthesize(query, mode, &results);

        info!(%mode, results = results.len(), "query prepared");

        Ok(PreparedAnswer {
            query: query.to_string(),
            results,
            mode,
            prompt,
        })
    }

    /// Start generating the answer for a prepared query
    pub async fn respond(&self, prepared: &PreparedAnswer) -> Result<ResponseStream> {
        self.generator.stream(prepared.prompt.clone()).await
    }

    /// Prepare and generate, collecting the whole answer
    pub async fn answer(&self, query: &str) -> Result<(PreparedAnswer, String)> {
        let prepared = self.prepare(query).await?;
        let text = self.respond(&prepared).await?.collect_text().await?;
        Ok((prepared, text))
    }
}
