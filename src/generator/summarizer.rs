use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SummaryFailurePolicy;
use crate::generator::state::{FetchedRecord, RunState, StateUpdate, SummarizedRecord};
use crate::generator::types::Stage;
use crate::llm::LanguageModel;

pub const NOTHING_TO_SUMMARIZE: &str = "No papers to summarize.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert science communicator. Your task is to summarize the following research paper abstract in simple, layman's terms. Avoid all jargon and complex technical details. Explain the core idea, what problem it tries to solve, and its potential impact, as if you were explaining it to a 10-year-old or someone completely new to AI. The summary should be concise, ideally 2-4 sentences. Focus on clarity and simplicity above all else.";

/// 单篇论文的用户消息
pub fn summary_user_prompt(record: &FetchedRecord) -> String {
    format!(
        "Please summarize this abstract:\n\nTitle: {}\n\nAbstract: {}",
        record.title, record.abstract_text
    )
}

/// 第二阶段：逐篇调用语言模型生成通俗摘要
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    policy: SummaryFailurePolicy,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, policy: SummaryFailurePolicy) -> Self {
        Self { model, policy }
    }

    /// 按顺序逐篇生成摘要，输出与输入一一对应
    ///
    /// 输入为空时沿用上游已有的错误信息，没有时写入 [`NOTHING_TO_SUMMARIZE`]。
    pub async fn summarize(
        &self,
        records: &[FetchedRecord],
        upstream_error: Option<&str>,
    ) -> StateUpdate {
        if records.is_empty() {
            let update = StateUpdate::summarized(vec![]);
            return match upstream_error {
                Some(e) if !e.trim().is_empty() => update,
                _ => update.with_error(NOTHING_TO_SUMMARIZE),
            };
        }

        let total = records.len();
        let mut summarized = Vec::with_capacity(total);
        let mut failures = 0usize;

        for (i, record) in records.iter().enumerate() {
            info!(
                "🧠 正在总结第 {}/{} 篇: {}",
                i + 1,
                total,
                record.title.chars().take(50).collect::<String>()
            );
            match self.summarize_one(record).await {
                Ok(summary) => {
                    debug!(catalog_id = %record.catalog_id, %summary, "summarized");
                    summarized.push(SummarizedRecord::new(record.clone(), summary));
                }
                Err(e) => match self.policy {
                    SummaryFailurePolicy::Isolate => {
                        warn!("⚠️ 论文 {} 摘要生成失败: {}", record.catalog_id, e);
                        failures += 1;
                        summarized.push(SummarizedRecord::new(
                            record.clone(),
                            format!("Summary unavailable: {}", e),
                        ));
                    }
                    SummaryFailurePolicy::Abort => {
                        warn!("❌ 论文 {} 摘要生成失败，终止本批摘要: {}", record.catalog_id, e);
                        return StateUpdate::summarized(vec![])
                            .with_error(format!("Summarization aborted: {}", e));
                    }
                },
            }
        }

        info!("✓ 摘要完成 {}/{}", total - failures, total);
        let update = StateUpdate::summarized(summarized);
        if failures > 0 {
            update.with_error(format!(
                "Failed to summarize {} of {} papers.",
                failures, total
            ))
        } else {
            update
        }
    }

    async fn summarize_one(&self, record: &FetchedRecord) -> anyhow::Result<String> {
        let reply = self
            .model
            .complete(SUMMARY_SYSTEM_PROMPT, &summary_user_prompt(record))
            .await?;
        let reply = reply.trim();
        if reply.is_empty() {
            anyhow::bail!("model returned an empty summary");
        }
        Ok(reply.to_string())
    }
}

impl Stage for Summarizer {
    fn name(&self) -> &'static str {
        "summarize_papers"
    }

    async fn execute(&self, state: &RunState) -> StateUpdate {
        self.summarize(&state.fetched, state.error.as_deref())
            .await
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::llm::LanguageModel;

    /// 根据用户消息中的标题生成回复；标题在failing中的请求返回错误
    #[derive(Default)]
    pub struct ScriptedModel {
        pub failing: Vec<String>,
        pub prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedModel {
        pub fn failing_on(titles: &[&str]) -> Self {
            Self {
                failing: titles.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            let title = user_prompt
                .lines()
                .find_map(|l| l.strip_prefix("Title: "))
                .unwrap_or_default()
                .to_string();
            if self.failing.contains(&title) {
                anyhow::bail!("rate limit exceeded for {}", title);
            }
            Ok(format!("  Simple take on {}.  ", title))
        }
    }
}
