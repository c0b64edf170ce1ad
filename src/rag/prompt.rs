//! Prompt synthesis
//!
//! Pure and deterministic: the same query, mode and results always produce
//! the same prompt text.

use super::classifier::PromptMode;
use super::retrieval::{QueryResult, ScoredBid};

/// Bullet line for one result
pub fn format_result_line(hit: &ScoredBid) -> String {
    format!(
        "- {} (기관: {}, 유사도: {}%)",
        hit.metadata.title,
        hit.metadata.organization,
        hit.similarity_percent()
    )
}

/// Build the generation prompt for `query`
pub fn synthesize(query: &str, mode: PromptMode, results: &QueryResult) -> String {
    match mode {
        PromptMode::Greeting => greeting_prompt(),
        PromptMode::NoResults => no_results_prompt(query),
        PromptMode::Analytical => analytical_prompt(query, results),
    }
}

fn greeting_prompt() -> String {
    "당신은 조달청 입찰 정보를 검색하고 분석해 주는 도우미입니다.\n\
     사용자에게 자신을 간단히 소개하고, '서울시 도로공사'처럼 사업 분야나 기관, \
     지역을 입력하면 유사한 낙찰 사례를 찾아 준다고 안내하세요.\n\
     두 문장 이내로 답하세요."
        .to_string()
}

fn no_results_prompt(query: &str) -> String {
    format!(
        "사용자가 '{}'(으)로 입찰 정보를 검색했지만 관련 자료를 찾지 못했습니다.\n\
         정중하게 사과하고, 'AI 챗봇'이나 '도로 보수공사'처럼 다른 키워드로 \
         다시 검색해 보도록 제안하세요.\n\
         한두 문장으로 답하세요.",
        query
    )
}

fn analytical_prompt(query: &str, results: &QueryResult) -> String {
    let mut block = String::new();
    for hit in results {
        block.push_str(&format_result_line(hit));
        block.push('\n');
    }

    format!(
        "당신은 공공 조달 입찰 데이터를 분석하는 전문가입니다.\n\
         사용자 질문: {}\n\n\
         검색된 유사 입찰 사례:\n{}\n\
         위 사례들의 공통된 특징만 요약하세요. 발주 기관의 유형, 사업 분야, \
         지역에 초점을 맞추고 개별 사업명을 나열하지 마세요.\n\
         두 문장으로 답하세요.",
        query, block
    )
}
