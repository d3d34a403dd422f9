use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use tracing::info;

use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::orchestrator::DigestOrchestrator;
use crate::generator::outlet::{DiskOutlet, Outlet};
use crate::generator::reporter::REPORT_FAILED_MARKER;
use crate::generator::state::RunState;

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct DigestOutcome {
    /// 最终报告，失败时为以 `Report Generation Failed` 开头的说明
    pub report_text: String,
    pub error: Option<String>,
    pub state: RunState,
    /// 写入磁盘的文件，未配置输出目录时为空
    pub saved_paths: Vec<PathBuf>,
}

impl DigestOutcome {
    pub fn new(state: RunState, saved_paths: Vec<PathBuf>) -> Self {
        Self {
            report_text: state.report_text.clone(),
            error: state.error.clone(),
            state,
            saved_paths,
        }
    }

    /// 报告正文本身是否为失败说明
    pub fn is_failure_report(&self) -> bool {
        self.report_text.contains(REPORT_FAILED_MARKER)
    }
}

/// 启动摘要工作流
pub async fn launch(config: &Config) -> Result<DigestOutcome> {
    config.validate()?;
    let context = GeneratorContext::new(config.clone())?;
    launch_with_context(&context).await
}

/// 使用已装配好的上下文执行工作流
pub async fn launch_with_context(context: &GeneratorContext) -> Result<DigestOutcome> {
    let config = &context.config;
    config.validate()?;

    let report_date = Local::now().date_naive();
    let orchestrator = DigestOrchestrator::from_context(context, report_date);
    let state = orchestrator
        .run(config.normalized_categories(), config.paper_count)
        .await;

    let saved_paths = match &config.output_path {
        Some(output_dir) => DiskOutlet::new(output_dir).save(&state, report_date).await?,
        None => vec![],
    };

    if let Some(error) = &state.error {
        info!("⚠️ 运行结束，附带错误信息: {}", error);
    }

    Ok(DigestOutcome::new(state, saved_paths))
}
