//! 流水线运行状态
//!
//! 每个阶段读取上一阶段的 [`RunState`]，返回一个 [`StateUpdate`] 增量，
//! 由编排器通过 [`RunState::apply`] 合并成新的状态。

use serde::{Deserialize, Serialize};

/// arXiv摘要页的规范链接前缀
pub const CANONICAL_ABS_URL: &str = "http://arxiv.org/abs/";

/// 一篇论文的元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub title: String,
    pub authors: Vec<String>,
    /// YYYY-MM-DD
    pub published_date: String,
    /// 摘要原文，换行已替换为空格
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub document_url: String,
    pub catalog_id: String,
}

impl FetchedRecord {
    /// 由catalog_id推导出的摘要页链接
    pub fn canonical_url(&self) -> String {
        format!("{}{}", CANONICAL_ABS_URL, self.catalog_id)
    }
}

/// 附带通俗摘要的论文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedRecord {
    #[serde(flatten)]
    pub record: FetchedRecord,
    pub plain_summary: String,
}

impl SummarizedRecord {
    pub fn new(record: FetchedRecord, plain_summary: impl Into<String>) -> Self {
        Self {
            record,
            plain_summary: plain_summary.into(),
        }
    }
}

/// 一次运行的完整状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub requested_categories: Vec<String>,
    pub requested_count: usize,
    pub fetched: Vec<FetchedRecord>,
    pub summarized: Vec<SummarizedRecord>,
    pub report_text: String,
    pub error: Option<String>,
}

impl RunState {
    /// 初始状态，分类去重并保持顺序
    pub fn new(categories: Vec<String>, count: usize) -> Self {
        let mut requested_categories: Vec<String> = Vec::with_capacity(categories.len());
        for category in categories {
            let category = category.trim().to_string();
            if !category.is_empty() && !requested_categories.contains(&category) {
                requested_categories.push(category);
            }
        }
        Self {
            requested_categories,
            requested_count: count,
            ..Default::default()
        }
    }

    /// 合并一个阶段的输出，返回新的状态
    pub fn apply(mut self, update: StateUpdate) -> Self {
        if let Some(fetched) = update.fetched {
            self.fetched = fetched;
        }
        if let Some(summarized) = update.summarized {
            self.summarized = summarized;
        }
        if let Some(report_text) = update.report_text {
            self.report_text = report_text;
        }
        match update.error {
            ErrorUpdate::Keep => {}
            ErrorUpdate::Clear => self.error = None,
            ErrorUpdate::Set(message) => self.error = Some(message),
        }
        self
    }
}

/// 阶段对错误字段的处理
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorUpdate {
    #[default]
    Keep,
    Clear,
    Set(String),
}

/// 阶段输出的状态增量，未设置的字段保持不变
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub fetched: Option<Vec<FetchedRecord>>,
    pub summarized: Option<Vec<SummarizedRecord>>,
    pub report_text: Option<String>,
    pub error: ErrorUpdate,
}

impl StateUpdate {
    pub fn fetched(records: Vec<FetchedRecord>) -> Self {
        Self {
            fetched: Some(records),
            ..Default::default()
        }
    }

    pub fn summarized(records: Vec<SummarizedRecord>) -> Self {
        Self {
            summarized: Some(records),
            ..Default::default()
        }
    }

    pub fn report(text: String) -> Self {
        Self {
            report_text: Some(text),
            ..Default::default()
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = ErrorUpdate::Set(message.into());
        self
    }

    pub fn clearing_error(mut self) -> Self {
        self.error = ErrorUpdate::Clear;
        self
    }
}
