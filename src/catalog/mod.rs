//! 论文目录服务 - 按分类检索最新论文元数据

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod arxiv;

pub use arxiv::ArxivClient;

/// 目录服务错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no categories given")]
    EmptyQuery,
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected content-type: {content_type} body: {preview}")]
    UnexpectedContentType {
        content_type: String,
        preview: String,
    },
    #[error("malformed Atom feed: {0}")]
    Parse(String),
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Descending => "descending",
            SortOrder::Ascending => "ascending",
        }
    }
}

/// 按提交时间排序的分类检索请求
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub categories: Vec<String>,
    pub max_results: usize,
    pub sort_order: SortOrder,
}

impl CatalogQuery {
    /// 最新优先的检索请求
    pub fn latest(categories: Vec<String>, max_results: usize) -> Self {
        Self {
            categories,
            max_results,
            sort_order: SortOrder::Descending,
        }
    }

    /// 分类之间的析取查询，形如 `cat:cs.AI OR cat:cs.LG`
    pub fn search_expression(&self) -> Result<String, CatalogError> {
        let terms: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| format!("cat:{}", c))
            .collect();
        if terms.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }
        Ok(terms.join(" OR "))
    }
}

/// 目录服务返回的原始条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 条目ID，通常是摘要页URL，如 `http://arxiv.org/abs/2501.01234v1`
    pub entry_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub summary: String,
    pub abs_url: Option<String>,
    pub pdf_url: Option<String>,
}

/// 论文目录服务
#[async_trait]
pub trait PaperCatalog: Send + Sync {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_expression_single_category() {
        let query = CatalogQuery::latest(vec!["cs.AI".to_string()], 1);
        assert_eq!(query.search_expression().unwrap(), "cat:cs.AI");
    }

    #[test]
    fn test_search_expression_is_disjunctive() {
        let query = CatalogQuery::latest(
            vec!["cs.AI".to_string(), " stat.ML ".to_string(), "".to_string()],
            5,
        );
        assert_eq!(
            query.search_expression().unwrap(),
            "cat:cs.AI OR cat:stat.ML"
        );
        assert_eq!(query.sort_order, SortOrder::Descending);
    }

    #[test]
    fn test_search_expression_rejects_empty() {
        let query = CatalogQuery::latest(vec![], 5);
        assert!(matches!(
            query.search_expression(),
            Err(CatalogError::EmptyQuery)
        ));
    }
}
