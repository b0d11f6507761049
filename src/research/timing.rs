use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 时间跟踪作用域
///
/// 同一阶段可能多次执行（修订循环），耗时按阶段累加。
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    phase_durations: HashMap<String, Duration>,
    phase_runs: HashMap<String, u32>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: HashMap::new(),
            phase_runs: HashMap::new(),
        }
    }

    /// 开始一个阶段的计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        *self
            .phase_durations
            .entry(phase_name.to_string())
            .or_default() += duration;
        *self.phase_runs.entry(phase_name.to_string()).or_insert(0) += 1;
        Some(duration)
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_phase_durations(&self) -> &HashMap<String, Duration> {
        &self.phase_durations
    }

    pub fn get_phase_runs(&self, phase_name: &str) -> u32 {
        self.phase_runs.get(phase_name).copied().unwrap_or(0)
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("各阶段执行时间:\n");
            let mut phases: Vec<_> = self.phase_durations.iter().collect();
            phases.sort_by(|a, b| a.0.cmp(b.0));
            for (phase, duration) in phases {
                report.push_str(&format!(
                    "- {} x{}: {:.3}秒\n",
                    phase,
                    self.get_phase_runs(phase),
                    duration.as_secs_f64()
                ));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_phase_accumulates() {
        let mut timing = TimingScope::new();
        timing.start_phase("compose");
        assert!(timing.end_phase("compose").is_some());
        timing.start_phase("compose");
        assert!(timing.end_phase("compose").is_some());

        assert_eq!(timing.get_phase_runs("compose"), 2);
        assert_eq!(timing.get_phase_runs("review"), 0);
        assert!(timing.get_phase_durations().contains_key("compose"));
    }

    #[test]
    fn test_end_without_start() {
        let mut timing = TimingScope::new();
        assert!(timing.end_phase("filter").is_none());
        assert!(timing.generate_timing_report().starts_with("总执行时间"));
    }
}
