use std::time::Instant;

use chrono::NaiveDate;
use tracing::info;

use crate::generator::context::GeneratorContext;
use crate::generator::fetcher::Fetcher;
use crate::generator::reporter::Reporter;
use crate::generator::state::RunState;
use crate::generator::summarizer::Summarizer;
use crate::generator::types::Stage;

/// 摘要流水线编排器：Fetcher → Summarizer → Reporter
pub struct DigestOrchestrator {
    fetcher: Fetcher,
    summarizer: Summarizer,
    reporter: Reporter,
}

impl DigestOrchestrator {
    pub fn new(fetcher: Fetcher, summarizer: Summarizer, reporter: Reporter) -> Self {
        Self {
            fetcher,
            summarizer,
            reporter,
        }
    }

    /// 按上下文装配各阶段，报告使用给定日期
    pub fn from_context(context: &GeneratorContext, report_date: NaiveDate) -> Self {
        Self::new(
            Fetcher::new(context.catalog.clone()),
            Summarizer::new(
                context.llm.clone(),
                context.config.llm.summary_failure_policy,
            ),
            Reporter::with_date(report_date),
        )
    }

    /// 依次执行三个阶段；任何阶段的空结果或错误都不会跳过后续阶段
    pub async fn run(&self, categories: Vec<String>, count: usize) -> RunState {
        info!("🚀 开始生成论文摘要报告...");
        let state = RunState::new(categories, count);

        let state = self.execute_stage(&self.fetcher, state).await;
        let state = self.execute_stage(&self.summarizer, state).await;
        let state = self.execute_stage(&self.reporter, state).await;

        info!("✓ 论文摘要流程执行完毕");
        state
    }

    async fn execute_stage<S>(&self, stage: &S, state: RunState) -> RunState
    where
        S: Stage,
    {
        info!("🤖 执行 {} 阶段...", stage.name());
        let started = Instant::now();
        let update = stage.execute(&state).await;
        let next = state.apply(update);
        info!(
            "✓ {} 完成，耗时 {:.2}秒",
            stage.name(),
            started.elapsed().as_secs_f64()
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SummaryFailurePolicy;
    use crate::generator::fetcher::NO_PAPERS_FOUND;
    use crate::generator::fetcher::fakes::{FailingCatalog, StaticCatalog, entry};
    use crate::generator::reporter::REPORT_FAILED_MARKER;
    use crate::generator::summarizer::fakes::ScriptedModel;

    fn orchestrator(
        catalog: Arc<dyn crate::catalog::PaperCatalog>,
        model: Arc<ScriptedModel>,
        policy: SummaryFailurePolicy,
    ) -> DigestOrchestrator {
        DigestOrchestrator::new(
            Fetcher::new(catalog),
            Summarizer::new(model, policy),
            Reporter::with_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_single_paper_run() {
        let catalog = Arc::new(StaticCatalog::new(vec![entry("X", "2501.00001v1", 14)]));
        let model = Arc::new(ScriptedModel::default());
        let orchestrator = orchestrator(catalog, model, SummaryFailurePolicy::Isolate);

        let state = orchestrator.run(vec!["cs.AI".to_string()], 1).await;

        assert_eq!(state.fetched.len(), 1);
        assert_eq!(state.summarized.len(), 1);
        assert!(state.report_text.contains("Paper 1: X"));
        assert!(state.report_text.contains("Simple take on X."));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_no_papers_still_runs_every_stage() {
        let catalog = Arc::new(StaticCatalog::new(vec![]));
        let model = Arc::new(ScriptedModel::default());
        let orchestrator = orchestrator(catalog, model.clone(), SummaryFailurePolicy::Isolate);

        let state = orchestrator.run(vec!["cs.AI".to_string()], 3).await;

        assert!(state.fetched.is_empty());
        assert!(state.summarized.is_empty());
        assert!(state.report_text.contains(REPORT_FAILED_MARKER));
        assert_eq!(state.error.as_deref(), Some(NO_PAPERS_FOUND));
        assert_eq!(
            state.report_text,
            format!("{}: {}", REPORT_FAILED_MARKER, NO_PAPERS_FOUND)
        );
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_surfaces_in_report() {
        let model = Arc::new(ScriptedModel::default());
        let orchestrator =
            orchestrator(Arc::new(FailingCatalog), model, SummaryFailurePolicy::Isolate);

        let state = orchestrator.run(vec!["cs.AI".to_string()], 2).await;

        assert!(state.fetched.is_empty());
        assert!(state.report_text.starts_with(REPORT_FAILED_MARKER));
        let error = state.error.unwrap();
        assert!(error.starts_with("ArXiv API error: "));
        assert!(state.report_text.contains(&error));
    }

    #[tokio::test]
    async fn test_abort_policy_yields_failure_report() {
        let catalog = Arc::new(StaticCatalog::new(vec![
            entry("A", "1", 3),
            entry("B", "2", 2),
        ]));
        let model = Arc::new(ScriptedModel::failing_on(&["A"]));
        let orchestrator = orchestrator(catalog, model, SummaryFailurePolicy::Abort);

        let state = orchestrator.run(vec!["cs.AI".to_string()], 2).await;

        assert_eq!(state.fetched.len(), 2);
        assert!(state.summarized.is_empty());
        assert_eq!(
            state.report_text,
            "Report Generation Failed: Summarization aborted: rate limit exceeded for A"
        );
    }
}
