use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    catalog::{ArxivClient, PaperCatalog},
    config::Config,
    llm::{LLMClient, LanguageModel},
};

#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// 论文目录服务
    pub catalog: Arc<dyn PaperCatalog>,
    /// 语言模型，用于生成通俗摘要
    pub llm: Arc<dyn LanguageModel>,
}

impl GeneratorContext {
    /// 按配置构造arXiv客户端与LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let catalog =
            ArxivClient::new(&config.catalog).context("Failed to build arXiv client")?;
        let llm = LLMClient::new(config.llm.clone()).context("Failed to build LLM client")?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(catalog),
            Arc::new(llm),
        ))
    }

    /// 使用外部提供的目录服务与语言模型
    pub fn with_collaborators(
        config: Config,
        catalog: Arc<dyn PaperCatalog>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            config,
            catalog,
            llm,
        }
    }
}
