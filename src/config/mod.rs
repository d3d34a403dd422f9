use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 默认查询的arXiv分类
pub const DEFAULT_CATEGORIES: [&str; 5] = ["cs.AI", "cs.LG", "stat.ML", "cs.CV", "cs.CL"];

/// 未指定配置文件时，尝试从工作目录加载的默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "digest.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 单篇摘要生成失败时的处理策略
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFailurePolicy {
    /// 用占位文本替代失败的摘要，继续处理剩余论文
    #[serde(rename = "isolate")]
    #[default]
    Isolate,
    /// 第一次失败即终止整批摘要
    #[serde(rename = "abort")]
    Abort,
}

impl std::fmt::Display for SummaryFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryFailurePolicy::Isolate => write!(f, "isolate"),
            SummaryFailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

impl std::str::FromStr for SummaryFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "isolate" => Ok(SummaryFailurePolicy::Isolate),
            "abort" => Ok(SummaryFailurePolicy::Abort),
            _ => Err(format!("Unknown failure policy: {}", s)),
        }
    }
}

/// 配置校验错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one category is required")]
    NoCategories,
    #[error("paper count must be between 1 and {max}, got {count}")]
    PaperCountOutOfRange { count: usize, max: usize },
    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    TemperatureOutOfRange(f64),
    #[error("max_tokens must be positive")]
    ZeroMaxTokens,
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 查询的分类标签
    pub categories: Vec<String>,

    /// 本次获取的论文数量
    pub paper_count: usize,

    /// 允许请求的论文数量上限
    pub max_paper_count: usize,

    /// 报告输出目录，为空时只打印到终端
    pub output_path: Option<PathBuf>,

    /// 论文目录服务配置
    pub catalog: CatalogConfig,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// 论文目录服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// arXiv查询接口地址
    pub base_url: String,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    pub user_agent: String,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，为空时使用provider的默认地址
    pub api_base_url: String,

    /// 用于生成摘要的模型
    pub model: String,

    /// 单次生成的最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 尝试次数，1表示不重试
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单篇摘要失败时的处理策略
    pub summary_failure_policy: SummaryFailurePolicy,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 加载配置：显式路径优先，其次是工作目录下的默认配置文件，最后使用默认值
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let default_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Config::default())
        }
    }

    /// 去重后的分类标签，保持原有顺序
    pub fn normalized_categories(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for category in &self.categories {
            let category = category.trim();
            if !category.is_empty() && !seen.iter().any(|c| c == category) {
                seen.push(category.to_string());
            }
        }
        seen
    }

    /// 校验配置取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normalized_categories().is_empty() {
            return Err(ConfigError::NoCategories);
        }
        if self.paper_count == 0 || self.paper_count > self.max_paper_count {
            return Err(ConfigError::PaperCountOutOfRange {
                count: self.paper_count,
                max: self.max_paper_count,
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(self.llm.temperature));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            paper_count: 5,
            max_paper_count: 20,
            output_path: None,
            catalog: CatalogConfig::default(),
            llm: LLMConfig::default(),
            verbose: false,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://export.arxiv.org/api/query"),
            timeout_seconds: 30,
            user_agent: format!("research-digest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LLMConfig {
    /// 显式配置的API基地址
    pub fn base_url_override(&self) -> Option<&str> {
        let url = self.api_base_url.trim();
        if url.is_empty() { None } else { Some(url) }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("DIGEST_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::new(),
            model: String::from("gpt-4o-mini"),
            max_tokens: 250,
            temperature: 0.2,
            retry_attempts: 1,
            retry_delay_ms: 2000,
            summary_failure_policy: SummaryFailurePolicy::default(),
        }
    }
}
