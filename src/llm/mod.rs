use anyhow::Result;
use async_trait::async_trait;

pub mod client;

pub use client::LLMClient;

/// 语言模型服务 - 给定系统指令与用户消息，返回生成文本
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
