use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{CatalogEntry, CatalogQuery, PaperCatalog};
use crate::generator::state::{FetchedRecord, RunState, StateUpdate};
use crate::generator::types::Stage;

pub const NO_PAPERS_FOUND: &str = "No papers found for the given categories.";

/// 第一阶段：从论文目录获取最新论文
pub struct Fetcher {
    catalog: Arc<dyn PaperCatalog>,
}

impl Fetcher {
    pub fn new(catalog: Arc<dyn PaperCatalog>) -> Self {
        Self { catalog }
    }

    /// 获取至多count篇论文，按提交时间倒序
    pub async fn fetch(&self, categories: &[String], count: usize) -> StateUpdate {
        if count == 0 {
            return StateUpdate::fetched(vec![]).with_error(NO_PAPERS_FOUND);
        }

        let query = CatalogQuery::latest(categories.to_vec(), count);
        match self.catalog.search(&query).await {
            Ok(entries) => {
                let mut records: Vec<FetchedRecord> =
                    entries.into_iter().filter_map(to_record).collect();
                records.truncate(count);

                if records.is_empty() {
                    warn!("⚠️ {}", NO_PAPERS_FOUND);
                    return StateUpdate::fetched(vec![]).with_error(NO_PAPERS_FOUND);
                }

                info!("📥 已获取 {} 篇论文", records.len());
                for record in &records {
                    debug!(catalog_id = %record.catalog_id, title = %record.title, "fetched");
                }
                StateUpdate::fetched(records).clearing_error()
            }
            Err(e) => {
                warn!("❌ 获取arXiv论文失败: {}", e);
                StateUpdate::fetched(vec![]).with_error(format!("ArXiv API error: {}", e))
            }
        }
    }
}

impl Stage for Fetcher {
    fn name(&self) -> &'static str {
        "fetch_arxiv"
    }

    async fn execute(&self, state: &RunState) -> StateUpdate {
        self.fetch(&state.requested_categories, state.requested_count)
            .await
    }
}

/// 目录条目规范化为论文记录，标题为空的条目被丢弃
fn to_record(entry: CatalogEntry) -> Option<FetchedRecord> {
    let title = collapse_whitespace(&entry.title);
    if title.is_empty() {
        return None;
    }

    let catalog_id = entry
        .entry_id
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(&entry.entry_id)
        .to_string();
    let document_url = entry
        .pdf_url
        .or(entry.abs_url)
        .unwrap_or_else(|| entry.entry_id.clone());

    Some(FetchedRecord {
        title,
        authors: entry.authors,
        published_date: entry.published.format("%Y-%m-%d").to_string(),
        abstract_text: entry.summary.replace('\n', " ").trim().to_string(),
        document_url,
        catalog_id,
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
