use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheManager, CachePerformanceReport, CachedReport};
use crate::config::Config;
use crate::history::{HistoryEntry, HistoryLog};
use crate::outlet::DiskOutlet;
use crate::research::{PipelineExecutionError, ResearchOutcome, ValidationError, WorkflowEngine};
use crate::utils::normalize_topic;

/// 缓存命中时返回的 file_path 标记
pub const CACHE_FILE_PATH: &str = "database-cache";

/// 主题的最小长度（去除首尾空白后按字符计）
pub const MIN_QUERY_CHARS: usize = 3;

/// 研究请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            thread_id: None,
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Err(ValidationError::TopicTooShort {
                min: MIN_QUERY_CHARS,
            });
        }
        Ok(())
    }
}

/// 研究响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub query: String,
    pub result: String,
    pub file_path: Option<String>,
    pub suggestions: Vec<String>,
}

impl ResearchResponse {
    pub fn is_cached(&self) -> bool {
        self.file_path.as_deref() == Some(CACHE_FILE_PATH)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineExecutionError),

    #[error("research pipeline exceeded the {0:?} deadline")]
    DeadlineExceeded(Duration),
}

/// 研究服务：校验、缓存、调用引擎、归档与历史记录
pub struct ResearchService {
    engine: Arc<WorkflowEngine>,
    cache: CacheManager,
    outlet: DiskOutlet,
    history: HistoryLog,
    pipeline_timeout: Option<Duration>,
    force_regenerate: bool,
}

impl ResearchService {
    pub fn new(engine: Arc<WorkflowEngine>, config: &Config) -> Self {
        let pipeline_timeout = (config.pipeline_timeout_seconds > 0)
            .then(|| Duration::from_secs(config.pipeline_timeout_seconds));

        Self {
            engine,
            cache: CacheManager::new(config.cache.clone()),
            outlet: DiskOutlet::new(config.output_path.clone()),
            history: HistoryLog::new(config.history_path()),
            pipeline_timeout,
            force_regenerate: config.force_regenerate,
        }
    }

    pub async fn research(
        &self,
        request: &ResearchRequest,
    ) -> Result<ResearchResponse, ServiceError> {
        self.research_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// 处理一次研究请求
    ///
    /// 外部取消信号在阶段边界生效；超时会直接丢弃正在执行的流程。
    pub async fn research_with_cancellation(
        &self,
        request: &ResearchRequest,
        cancel: &CancellationToken,
    ) -> Result<ResearchResponse, ServiceError> {
        request.validate()?;
        let query = request.query.trim();
        let slug = normalize_topic(query);

        if !self.force_regenerate {
            if let Some(cached) = self.cache.get(&slug).await {
                return Ok(ResearchResponse {
                    query: request.query.clone(),
                    result: cached.report,
                    file_path: Some(CACHE_FILE_PATH.to_string()),
                    suggestions: Vec::new(),
                });
            }
        }

        let run = self.engine.run(query, request.thread_id.as_deref(), cancel);
        let state = match self.pipeline_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, run).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::error!(?deadline, "⏰ 研究流程超时");
                    return Err(ServiceError::DeadlineExceeded(deadline));
                }
            },
            None => run.await?,
        };

        let rejected = state.is_stopped();
        let outcome = ResearchOutcome::from(state);

        let file_path = if rejected {
            None
        } else {
            self.store(query, &slug, &outcome.report).await;
            self.outlet
                .save(query, &outcome.report)
                .await
                .map(|path| path.display().to_string())
        };

        let entry = HistoryEntry::new(query, &outcome.report, request.thread_id.as_deref());
        if let Err(e) = self.history.record(entry).await {
            tracing::warn!(error = %format!("{e:#}"), "⚠️ 历史记录写入失败");
        }

        Ok(ResearchResponse {
            query: request.query.clone(),
            result: outcome.report,
            file_path,
            suggestions: outcome.suggestions,
        })
    }

    async fn store(&self, query: &str, slug: &str, report: &str) {
        let cached = CachedReport {
            query: query.to_string(),
            report: report.to_string(),
        };
        let result = if self.force_regenerate {
            self.cache.replace(slug, cached).await
        } else {
            self.cache.set_if_absent(slug, cached).await.map(|_| ())
        };
        if let Err(e) = result {
            tracing::warn!(error = %format!("{e:#}"), "⚠️ 报告缓存写入失败");
        }
    }

    /// 最近的研究记录，最新的在前
    pub async fn history(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
        self.history.recent(limit).await
    }

    pub fn cache_report(&self) -> CachePerformanceReport {
        self.cache.generate_performance_report()
    }
}
