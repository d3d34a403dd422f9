use crate::config::{Config, LLMProvider, SummaryFailurePolicy};
use crate::generator::workflow::DigestOutcome;
use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// Research Digest - 拉取arXiv最新论文并生成通俗摘要报告
#[derive(Parser, Debug)]
#[command(name = "research-digest")]
#[command(
    about = "Fetches the latest arXiv papers for the given categories, summarizes each abstract in plain language with an LLM, and prints a digest report."
)]
#[command(version)]
pub struct Args {
    /// 论文数量
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// arXiv分类，逗号分隔，如 cs.AI,cs.LG
    #[arg(short, long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// 配置文件路径
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// LLM Provider (openai, mistral, openrouter, anthropic, deepseek, moonshot, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 摘要使用的模型
    #[arg(long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// arXiv API地址
    #[arg(long)]
    pub catalog_base_url: Option<String>,

    /// 单篇摘要失败时的处理方式 (isolate, abort)
    #[arg(long)]
    pub failure_policy: Option<String>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(count) = self.count {
            config.paper_count = count;
        }
        if let Some(categories) = self.categories {
            config.categories = categories;
        }
        if let Some(output_path) = self.output_path {
            config.output_path = Some(output_path);
        }

        // 覆盖LLM配置
        // 日志尚未初始化，未知取值直接报错
        if let Some(provider_str) = self.llm_provider {
            config.llm.provider = provider_str.parse::<LLMProvider>().map_err(|e| anyhow!(e))?;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(policy_str) = self.failure_policy {
            config.llm.summary_failure_policy = policy_str
                .parse::<SummaryFailurePolicy>()
                .map_err(|e| anyhow!(e))?;
        }

        if let Some(catalog_base_url) = self.catalog_base_url {
            config.catalog.base_url = catalog_base_url;
        }

        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

/// 默认日志过滤规则
pub fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "research_digest=debug"
    } else {
        "research_digest=info"
    }
}

/// 初始化日志，输出到stderr；`RUST_LOG` 优先
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(config.verbose)));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 生成终端展示文本
pub fn render_outcome(outcome: &DigestOutcome) -> String {
    let mut sections = Vec::new();

    if let Some(error) = &outcome.error
        && !outcome.is_failure_report()
    {
        sections.push(format!("An issue occurred: {}", error));
    }

    if outcome.report_text.trim().is_empty() {
        sections.push("No report was generated.".to_string());
    } else {
        sections.push(outcome.report_text.clone());
    }

    for path in &outcome.saved_paths {
        sections.push(format!("Saved: {}", path.display()));
    }

    sections.join("\n\n")
}
