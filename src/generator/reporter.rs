use chrono::{Local, NaiveDate};

use crate::generator::state::{RunState, StateUpdate, SummarizedRecord};
use crate::generator::types::Stage;

/// 报告生成失败时报告正文的前缀
pub const REPORT_FAILED_MARKER: &str = "Report Generation Failed";

pub const NO_SUMMARIES: &str = "No summaries available to compile report.";

/// 将摘要结果编排为报告文本，不依赖任何外部状态
pub fn compile_report(
    records: &[SummarizedRecord],
    error: Option<&str>,
    report_date: NaiveDate,
) -> String {
    if records.is_empty() {
        let message = error
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(NO_SUMMARIES);
        return format!("{}: {}", REPORT_FAILED_MARKER, message);
    }

    let mut parts = vec![format!(
        "AI Research Update - {}\n{}\n",
        report_date.format("%Y-%m-%d"),
        "=".repeat(40)
    )];

    for (i, summarized) in records.iter().enumerate() {
        let paper = &summarized.record;
        let authors = if paper.authors.is_empty() {
            "Unknown".to_string()
        } else {
            paper.authors.join(", ")
        };
        let canonical = paper.canonical_url();

        parts.push(format!("📄 Paper {}: {}", i + 1, paper.title));
        parts.push(format!("   Authors: {}", authors));
        parts.push(format!("   Published: {}", paper.published_date));
        parts.push(format!(
            "   ArXiv ID: {} (Link: [{}]({}))",
            paper.catalog_id, canonical, canonical
        ));
        parts.push(format!(
            "   PDF: [{}]({})",
            paper.document_url, paper.document_url
        ));
        parts.push(format!(
            "\n   🧠 Layman's Summary:\n   {}\n",
            summarized.plain_summary
        ));
        parts.push("-".repeat(30));
    }

    parts.join("\n")
}

/// 第三阶段：汇总报告
#[derive(Default)]
pub struct Reporter {
    /// 固定报告日期，为空时使用当天
    report_date: Option<NaiveDate>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(report_date: NaiveDate) -> Self {
        Self {
            report_date: Some(report_date),
        }
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Stage for Reporter {
    fn name(&self) -> &'static str {
        "compile_report"
    }

    async fn execute(&self, state: &RunState) -> StateUpdate {
        StateUpdate::report(compile_report(
            &state.summarized,
            state.error.as_deref(),
            self.report_date(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::state::fixtures::record;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_report_layout() {
        let records = vec![
            SummarizedRecord::new(record("First", "2501.00001v1"), "It is simple."),
            SummarizedRecord::new(record("Second", "2501.00002v1"), "Also simple."),
        ];

        let report = compile_report(&records, None, date());
        let expected_first_block = "📄 Paper 1: First
   Authors: Ada Lovelace, Alan Turing
   Published: 2025-01-14
   ArXiv ID: 2501.00001v1 (Link: [http://arxiv.org/abs/2501.00001v1](http://arxiv.org/abs/2501.00001v1))
   PDF: [http://arxiv.org/pdf/2501.00001v1](http://arxiv.org/pdf/2501.00001v1)

   🧠 Layman's Summary:
   It is simple.

------------------------------";

        assert!(report.starts_with(&format!(
            "AI Research Update - 2025-01-15\n{}\n",
            "=".repeat(40)
        )));
        assert!(report.contains(expected_first_block));
        assert!(report.contains("📄 Paper 2: Second"));
        assert!(report.ends_with(&"-".repeat(30)));
        assert!(!report.contains(REPORT_FAILED_MARKER));
    }

    #[test]
    fn test_report_is_deterministic() {
        let records = vec![SummarizedRecord::new(record("X", "1"), "Plain.")];
        assert_eq!(
            compile_report(&records, Some("ignored"), date()),
            compile_report(&records, Some("ignored"), date())
        );
    }

    #[test]
    fn test_report_without_authors() {
        let mut paper = record("Solo", "1");
        paper.authors.clear();
        let report = compile_report(&[SummarizedRecord::new(paper, "Plain.")], None, date());
        assert!(report.contains("   Authors: Unknown"));
    }

    #[test]
    fn test_empty_input_embeds_error() {
        let report = compile_report(&[], Some("No papers found for the given categories."), date());
        assert_eq!(
            report,
            "Report Generation Failed: No papers found for the given categories."
        );
    }

    #[test]
    fn test_empty_input_without_error() {
        assert_eq!(
            compile_report(&[], None, date()),
            format!("{}: {}", REPORT_FAILED_MARKER, NO_SUMMARIES)
        );
        assert_eq!(
            compile_report(&[], Some("  "), date()),
            format!("{}: {}", REPORT_FAILED_MARKER, NO_SUMMARIES)
        );
    }

    #[test]
    fn test_reporter_defaults_to_today() {
        assert_eq!(Reporter::new().report_date(), Local::now().date_naive());
        assert_eq!(Reporter::with_date(date()).report_date(), date());
    }

    #[tokio::test]
    async fn test_stage_writes_report_only() {
        let reporter = Reporter::with_date(date());
        let state = RunState::new(vec!["cs.AI".to_string()], 1)
            .apply(StateUpdate::fetched(vec![]).with_error("boom"));

        let update = reporter.execute(&state).await;
        assert_eq!(
            update.report_text.as_deref(),
            Some("Report Generation Failed: boom")
        );
        assert!(update.fetched.is_none());
        assert!(update.summarized.is_none());
        assert_eq!(reporter.name(), "compile_report");
    }
}
