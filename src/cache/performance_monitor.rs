use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 缓存性能监控器
#[derive(Clone, Default)]
pub struct CachePerformanceMonitor {
    metrics: Arc<CacheMetrics>,
}

#[derive(Default)]
struct CacheMetrics {
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    cache_writes: AtomicUsize,
    cache_errors: AtomicUsize,
}

/// 缓存性能报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePerformanceReport {
    /// 缓存命中率
    pub hit_rate: f64,
    pub total_lookups: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_errors: usize,
}

impl CachePerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, slug: &str) {
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::info!(slug, "💰 缓存命中 - 跳过研究流程");
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, slug: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(slug, "⌛ 缓存未命中 - 需要进行AI推理");
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, slug: &str) {
        self.metrics.cache_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(slug, "💾 缓存写入 - 报告已缓存");
    }

    /// 记录缓存错误
    pub fn record_cache_error(&self, slug: &str, error: &str) {
        self.metrics.cache_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(slug, error, "❌ 缓存错误");
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let total_lookups = hits + misses;

        let hit_rate = if total_lookups > 0 {
            hits as f64 / total_lookups as f64
        } else {
            0.0
        };

        CachePerformanceReport {
            hit_rate,
            total_lookups,
            cache_hits: hits,
            cache_misses: misses,
            cache_writes: self.metrics.cache_writes.load(Ordering::Relaxed),
            cache_errors: self.metrics.cache_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let monitor = CachePerformanceMonitor::new();
        monitor.record_cache_miss("solar");
        monitor.record_cache_hit("solar");
        monitor.record_cache_hit("solar");
        monitor.record_cache_write("solar");

        let report = monitor.generate_report();
        assert_eq!(report.total_lookups, 3);
        assert_eq!(report.cache_writes, 1);
        assert!((report.hit_rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_report() {
        let report = CachePerformanceMonitor::new().generate_report();
        assert_eq!(report.hit_rate, 0.0);
        assert_eq!(report.cache_errors, 0);
    }
}
