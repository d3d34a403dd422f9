use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::generator::state::RunState;

#[allow(async_fn_in_trait)]
pub trait Outlet {
    async fn save(&self, state: &RunState, report_date: NaiveDate) -> Result<Vec<PathBuf>>;
}

/// 将报告写入磁盘：`<date>-digest.md` 为报告正文，`<date>-digest.json` 为完整运行状态
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn file_stem(report_date: NaiveDate) -> String {
        format!("{}-digest", report_date.format("%Y-%m-%d"))
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, state: &RunState, report_date: NaiveDate) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).context(format!(
            "Failed to create output directory: {:?}",
            self.output_dir
        ))?;

        let stem = Self::file_stem(report_date);
        let markdown_path = self.output_dir.join(format!("{}.md", stem));
        let json_path = self.output_dir.join(format!("{}.json", stem));

        fs::write(&markdown_path, &state.report_text)
            .context(format!("Failed to write report: {:?}", markdown_path))?;
        fs::write(&json_path, serde_json::to_vec_pretty(state)?)
            .context(format!("Failed to write run state: {:?}", json_path))?;

        info!("💾 报告已保存: {}", markdown_path.display());
        Ok(vec![markdown_path, json_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::state::StateUpdate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_writes_markdown_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path().join("reports"));
        let state = RunState::new(vec!["cs.AI".to_string()], 1)
            .apply(StateUpdate::report("AI Research Update - 2025-01-15".to_string()));
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let paths = outlet.save(&state, date).await.unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(
            paths[0],
            temp_dir.path().join("reports").join("2025-01-15-digest.md")
        );
        assert_eq!(
            std::fs::read_to_string(&paths[0]).unwrap(),
            "AI Research Update - 2025-01-15"
        );
        let saved: RunState =
            serde_json::from_slice(&std::fs::read(&paths[1]).unwrap()).unwrap();
        assert_eq!(saved, state);
    }
}
