use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::CacheConfig;

pub mod performance_monitor;
pub use performance_monitor::{CachePerformanceMonitor, CachePerformanceReport};

/// 报告缓存存放的子目录
const REPORT_CATEGORY: &str = "reports";

/// 已缓存的研究报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedReport {
    pub query: String,
    pub report: String,
}

/// 缓存条目
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: DateTime<Utc>,
    /// slug的MD5哈希值，即缓存文件名
    pub key_hash: String,
}

/// 报告缓存管理器，按主题 slug 存取
pub struct CacheManager {
    config: CacheConfig,
    performance_monitor: CachePerformanceMonitor,
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            performance_monitor: CachePerformanceMonitor::new(),
        }
    }

    /// 生成slug的MD5哈希
    pub fn hash_key(&self, slug: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(slug.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn get_cache_path(&self, hash: &str) -> PathBuf {
        self.config
            .cache_dir
            .join(REPORT_CATEGORY)
            .join(format!("{}.json", hash))
    }

    fn is_expired(&self, created_at: DateTime<Utc>) -> bool {
        let age = Utc::now().signed_duration_since(created_at);
        age.num_seconds() > (self.config.expire_hours as i64).saturating_mul(3600)
    }

    /// 获取缓存的报告
    ///
    /// 读取或解析失败视为未命中并计入错误统计。
    pub async fn get(&self, slug: &str) -> Option<CachedReport> {
        if !self.config.enabled {
            return None;
        }

        let cache_path = self.get_cache_path(&self.hash_key(slug));
        if !fs::try_exists(&cache_path).await.unwrap_or(false) {
            self.performance_monitor.record_cache_miss(slug);
            return None;
        }

        let content = match fs::read_to_string(&cache_path).await {
            Ok(content) => content,
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(slug, &format!("读取文件失败: {}", e));
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<CachedReport>>(&content) {
            Ok(entry) if self.is_expired(entry.created_at) => {
                // 删除过期缓存
                let _ = fs::remove_file(&cache_path).await;
                self.performance_monitor.record_cache_miss(slug);
                None
            }
            Ok(entry) => {
                self.performance_monitor.record_cache_hit(slug);
                Some(entry.data)
            }
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(slug, &format!("反序列化失败: {}", e));
                None
            }
        }
    }

    /// 写入缓存，已存在有效条目时保持原样
    ///
    /// 返回是否实际写入。
    pub async fn set_if_absent(&self, slug: &str, report: CachedReport) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        let hash = self.hash_key(slug);
        let cache_path = self.get_cache_path(&hash);

        if let Ok(content) = fs::read_to_string(&cache_path).await {
            if let Ok(entry) = serde_json::from_str::<CacheEntry<CachedReport>>(&content) {
                if !self.is_expired(entry.created_at) {
                    return Ok(false);
                }
            }
        }

        self.write(&cache_path, hash, report, slug).await?;
        Ok(true)
    }

    /// 无条件覆盖缓存（强制重新生成时使用）
    pub async fn replace(&self, slug: &str, report: CachedReport) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let hash = self.hash_key(slug);
        let cache_path = self.get_cache_path(&hash);
        self.write(&cache_path, hash, report, slug).await
    }

    async fn write(
        &self,
        cache_path: &Path,
        key_hash: String,
        data: CachedReport,
        slug: &str,
    ) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create cache directory")?;
        }

        let entry = CacheEntry {
            data,
            created_at: Utc::now(),
            key_hash,
        };

        let content = serde_json::to_string_pretty(&entry).inspect_err(|e| {
            self.performance_monitor
                .record_cache_error(slug, &format!("序列化失败: {}", e))
        })?;

        match fs::write(cache_path, content).await {
            Ok(_) => {
                self.performance_monitor.record_cache_write(slug);
                Ok(())
            }
            Err(e) => {
                self.performance_monitor
                    .record_cache_error(slug, &format!("写入文件失败: {}", e));
                Err(e).context("Failed to write cache entry")
            }
        }
    }

    /// 生成性能报告
    pub fn generate_performance_report(&self) -> CachePerformanceReport {
        self.performance_monitor.generate_report()
    }
}
