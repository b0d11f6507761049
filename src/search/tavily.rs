use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{SearchConfig, SearchDepth};
use crate::research::error::SearchError;
use crate::research::ports::SearchPort;

/// 指数退避的基础间隔（毫秒）
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// 瞬时错误的最大重试次数上限
const MAX_RETRIES_CAP: u32 = 10;

/// 单条结果正文的最大字符数
const MAX_CONTENT_CHARS: usize = 1200;

/// Tavily 网络搜索适配器
pub struct TavilySearch {
    api_key: String,
    api_url: String,
    client: Client,
    max_results: u32,
    search_depth: SearchDepth,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            client: Client::new(),
            max_results: config.max_results.clamp(1, 20),
            search_depth: config.search_depth,
            timeout: Duration::from_secs(config.timeout_seconds.max(1)),
            max_retries: config.max_retries.min(MAX_RETRIES_CAP),
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// 第 `attempt` 次重试前的等待时间，按 2 的幂增长
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_base_delay.saturating_mul(factor)
    }

    async fn execute_with_retry(
        &self,
        request: &TavilyRequest<'_>,
    ) -> Result<TavilyResponse, TavilyError> {
        let mut last_error = TavilyError::Unknown("No attempts made".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "🔄 重试 Tavily 请求"
                );
                tokio::time::sleep(delay).await;
            }

            match self.execute_single_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    tracing::warn!(attempt, error = %e, "⚠️ Tavily 请求失败，准备重试");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn execute_single_request(
        &self,
        request: &TavilyRequest<'_>,
    ) -> Result<TavilyResponse, TavilyError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TavilyError::Timeout
                } else if e.is_connect() {
                    TavilyError::Connection(e.to_string())
                } else {
                    TavilyError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| TavilyError::ParseError(e.to_string()));
        }

        let error_text = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(TavilyError::Unauthorized),
            429 => Err(TavilyError::RateLimited),
            400 => Err(TavilyError::BadRequest(error_text)),
            code @ 500..=599 => Err(TavilyError::ServerError(code, error_text)),
            code => Err(TavilyError::HttpError(code, error_text)),
        }
    }
}

#[async_trait]
impl SearchPort for TavilySearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let request = TavilyRequest {
            query,
            max_results: self.max_results,
            search_depth: self.search_depth.as_str(),
            topic: "general",
            include_answer: false,
        };

        tracing::info!(query, "🔍 Tavily 网络搜索...");
        let response = self.execute_with_retry(&request).await?;
        tracing::debug!(results = response.results.len(), "✓ 搜索完成");

        Ok(response.to_text())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TavilyError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized - check API key")]
    Unauthorized,

    #[error("Rate limited - too many requests")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl TavilyError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TavilyError::Timeout
                | TavilyError::Connection(_)
                | TavilyError::RateLimited
                | TavilyError::ServerError(_, _)
        )
    }
}

impl From<TavilyError> for SearchError {
    fn from(e: TavilyError) -> Self {
        match e {
            TavilyError::Timeout => SearchError::Timeout,
            TavilyError::Unauthorized => SearchError::Unauthorized,
            TavilyError::RateLimited => SearchError::RateLimited,
            TavilyError::ParseError(msg) => SearchError::Parse(msg),
            other => SearchError::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: u32,
    search_depth: &'a str,
    topic: &'a str,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilyResponse {
    /// 拼接成供提示词使用的纯文本
    fn to_text(&self) -> String {
        let mut output = String::new();

        if let Some(answer) = self.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            output.push_str("Summary: ");
            output.push_str(answer.trim());
            output.push_str("\n\n");
        }

        if self.results.is_empty() {
            output.push_str("No results found.");
            return output;
        }

        for (index, result) in self.results.iter().enumerate() {
            let content: String = result.content.chars().take(MAX_CONTENT_CHARS).collect();
            output.push_str(&format!(
                "[{}] {}\nURL: {}\n{}\n\n",
                index + 1,
                result.title.trim(),
                result.url,
                content.trim()
            ));
        }

        output.trim_end().to_string()
    }
}
