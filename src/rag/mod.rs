//! Retrieval-grounded answering
//!
//! - Retrieval: embed the query, fetch neighbours, threshold and cap
//! - Classifier: choose the prompt mode from query and results
//! - Prompt: build the generation prompt
//! - Pipeline: run the steps for one interactive query

pub mod classifier;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

pub use classifier::{classify, is_greeting_like, PromptMode, GREETING_KEYWORDS};
pub use pipeline::{BidAssistant, PreparedAnswer};
pub use prompt::{format_result_line, synthesize};
pub use retrieval::{
    select_results, QueryResult, RetrievalEngine, ScoredBid, SearchParams, MAX_RESULTS,
    MIN_SIMILARITY, TOP_K,
};
