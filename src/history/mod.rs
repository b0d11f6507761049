use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// 默认展示的历史条数
pub const RECENT_HISTORY_LIMIT: usize = 5;

/// 一次研究请求的历史记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(query: &str, response: &str, thread_id: Option<&str>) -> Self {
        Self {
            query: query.to_string(),
            response: response.to_string(),
            thread_id: thread_id.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}

/// 基于 JSON 文件的历史日志
///
/// 进程内的写入通过互斥锁串行化；不处理多进程同时写同一文件。
pub struct HistoryLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .context(format!("Failed to read history file: {:?}", self.path))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).context("Failed to parse history file")
    }

    /// 追加一条记录
    pub async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create history directory")?;
        }
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, content)
            .await
            .context(format!("Failed to write history file: {:?}", self.path))?;
        Ok(())
    }

    /// 最近的记录，按时间倒序
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.load().await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }
}
