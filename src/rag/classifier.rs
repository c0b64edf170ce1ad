//! Query classification

use std::fmt;

use super::retrieval::QueryResult;

/// Substrings marking a greeting or a request for help
pub const GREETING_KEYWORDS: [&str; 10] = [
    "안녕", "뭐", "누구", "어떻게", "할 수", "도움", "헬프", "help", "hi", "hello",
];

/// Shape of the prompt sent for generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Greeting,
    NoResults,
    Analytical,
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptMode::Greeting => "greeting",
            PromptMode::NoResults => "no-results",
            PromptMode::Analytical => "analytical",
        };
        f.write_str(name)
    }
}

/// Case-insensitive containment check against [`GREETING_KEYWORDS`]
pub fn is_greeting_like(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    GREETING_KEYWORDS.iter().any(|k| normalized.contains(k))
}

/// Pick the prompt mode
///
/// Results win over keywords: a greeting that also matches bids is analytical.
pub fn classify(query: &str, results: &QueryResult) -> PromptMode {
    if !results.is_empty() {
        PromptMode::Analytical
    } else if is_greeting_like(query) {
        PromptMode::Greeting
    } else {
        PromptMode::NoResults
    }
}
