use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;

use crate::utils::normalize_topic;

/// 报告归档：把每份新生成的报告写成 `<output_path>/<slug>.txt`
pub struct DiskOutlet {
    output_path: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn target_path(&self, topic: &str) -> PathBuf {
        self.output_path
            .join(format!("{}.txt", normalize_topic(topic)))
    }

    /// 保存报告，失败时只记录日志并返回 `None`
    pub async fn save(&self, topic: &str, report: &str) -> Option<PathBuf> {
        match self.try_save(topic, report).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "💾 报告已归档");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "⚠️ 报告归档失败");
                None
            }
        }
    }

    async fn try_save(&self, topic: &str, report: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_path)
            .await
            .context(format!("Failed to create output directory: {:?}", self.output_path))?;

        let path = self.target_path(topic);
        let content = format!(
            "Topic: {}\nGenerated At: {}\n\n{}",
            topic,
            Utc::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            report
        );

        fs::write(&path, content)
            .await
            .context(format!("Failed to write report: {:?}", path))?;
        Ok(path)
    }
}
