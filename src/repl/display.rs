//! Terminal output for the chat session
//!
//! Color-coded banner, result listing, streamed answers and errors.

use colored::*;
use std::io::{self, Write};

use crate::corpus::BidMetadata;
use crate::errors::RagError;
use crate::index::BuildReport;
use crate::rag::{PromptMode, QueryResult};

/// Group digits by thousands: `1234567` -> `"1,234,567"`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Display manager for the chat session
#[derive(Debug, Default)]
pub struct DisplayManager;

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, entries: u64) {
        let width = 64;
        let top = format!("{}", "=".repeat(width).cyan());
        let title = format!("  bidrag {} - 입찰 정보 검색 도우미", version);
        let info = format!(
            "  Model: {} | Indexed bids: {}",
            model,
            format_thousands(entries)
        );

        println!("\n{}", top);
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", top);
        println!(
            "검색할 사업이나 기관을 입력하세요 (예: {}). 종료: {}\n",
            "서울시 도로공사".green(),
            "quit".green()
        );
    }

    /// List accepted results, plus the average awarded amount when meaningful
    pub fn show_results(&self, query: &str, results: &QueryResult) {
        if results.is_empty() {
            println!("{}", "관련 입찰 정보를 찾지 못했습니다.".dimmed());
            return;
        }

        println!("\n{}", results_header(query, results.len()).bold().cyan());
        println!("{}", "-".repeat(60).cyan());
        for (i, hit) in results.iter().enumerate() {
            let meta = &hit.metadata;
            println!(
                "  {}. {}",
                (i + 1).to_string().cyan(),
                meta.title.bold()
            );
            println!("     기관: {}", meta.organization);
            if let Some(amount) = amount_line(meta) {
                println!("     {}", amount);
            }
            println!(
                "     유사도: {}",
                format!("{:.1}%", hit.similarity() * 100.0).green()
            );
        }

        if let Some(summary) = average_line(results) {
            println!("\n  {}", summary.yellow());
        }
        println!();
    }

    /// Header before the streamed answer
    pub fn start_answer(&self, mode: PromptMode) {
        let label = match mode {
            PromptMode::Analytical => "분석",
            PromptMode::Greeting | PromptMode::NoResults => "안내",
        };
        print!("{} ", format!("[{}]", label).bold().magenta());
        let _ = io::stdout().flush();
    }

    /// Print one streamed fragment without a newline
    pub fn stream_fragment(&self, fragment: &str) {
        print!("{}", fragment);
        let _ = io::stdout().flush();
    }

    pub fn end_answer(&self) {
        println!("\n");
    }

    /// Summary after an index build
    pub fn show_build_report(&self, report: &BuildReport) {
        println!(
            "{} Indexed {} of {} records {}",
            "✓".green(),
            format_thousands(report.indexed as u64),
            format_thousands(report.corpus_size as u64),
            format!("({:.1}s)", report.elapsed.as_secs_f64()).dimmed()
        );
        if report.skipped > 0 {
            self.show_warning(&format!(
                "{} records had no title or organization and were skipped",
                report.skipped
            ));
        }
    }

    /// Error message followed by what to do about it
    pub fn show_error(&self, error: &RagError) {
        println!("{} {}", "Error:".red().bold(), error.to_string().red());
        println!("  {}", error.remediation().dimmed());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_goodbye(&self) {
        println!("{}", "이용해 주셔서 감사합니다.".cyan());
    }
}

fn results_header(query: &str, count: usize) -> String {
    format!("'{}' 유사 사업 ({}건)", query, count)
}

/// Awarded amount with the rate when known; unawarded bids have no line
fn amount_line(meta: &BidMetadata) -> Option<String> {
    let amount = meta.amount();
    if amount == 0 {
        return None;
    }
    let rate = if meta.awarded_rate.is_empty() {
        String::new()
    } else {
        format!(" (낙찰률 {}%)", meta.awarded_rate)
    };
    Some(format!("낙찰금액: {}원{}", format_thousands(amount), rate))
}

/// Average line, shown for more than one result with a positive total
fn average_line(results: &QueryResult) -> Option<String> {
    if results.len() <= 1 || results.total_awarded_amount() == 0 {
        return None;
    }
    results
        .average_awarded_amount()
        .map(|avg| format!("평균 낙찰금액: {}원 ({}건)", format_thousands(avg), results.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::ScoredBid;

    fn results(amounts: &[&str]) -> QueryResult {
        QueryResult::new(
            amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| ScoredBid {
                    id: i.to_string(),
                    metadata: BidMetadata {
                        title: format!("사업 {}", i),
                        awarded_amount: amount.to_string(),
                        ..Default::default()
                    },
                    distance: 0.2,
                })
                .collect(),
        )
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(123456), "123,456");
        assert_eq!(format_thousands(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_average_line_needs_several_results() {
        assert_eq!(average_line(&results(&["5000"])), None);
        assert_eq!(average_line(&results(&["0", "0"])), None);
        assert_eq!(
            average_line(&results(&["1000000", "2000001"])).as_deref(),
            Some("평균 낙찰금액: 1,500,000원 (2건)")
        );
    }

    #[test]
    fn test_results_header_names_query_and_count() {
        assert_eq!(results_header("도로 공사", 3), "'도로 공사' 유사 사업 (3건)");
    }

    #[test]
    fn test_amount_line_skips_unawarded_bids() {
        let unawarded = BidMetadata {
            awarded_amount: "0".to_string(),
            awarded_rate: "87.5".to_string(),
            ..Default::default()
        };
        assert_eq!(amount_line(&unawarded), None);

        let awarded = BidMetadata {
            awarded_amount: "1234000".to_string(),
            awarded_rate: "87.5".to_string(),
            ..Default::default()
        };
        assert_eq!(
            amount_line(&awarded).as_deref(),
            Some("낙찰금액: 1,234,000원 (낙찰률 87.5%)")
        );

        let no_rate = BidMetadata {
            awarded_amount: "5000".to_string(),
            ..Default::default()
        };
        assert_eq!(amount_line(&no_rate).as_deref(), Some("낙찰금액: 5,000원"));
    }

    #[test]
    fn test_show_results_smoke() {
        let manager = DisplayManager::new();
        manager.show_results("사업", &results(&["1000", "2000"]));
        manager.show_results("사업", &QueryResult::default());
        manager.show_error(&RagError::Initialization("no index".to_string()));
    }
}
