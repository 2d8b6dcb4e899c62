use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const RECENT_LATENCY_WINDOW: usize = 5;

/// Running probe statistics for one endpoint.
#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub total_time: Duration,
    pub count: u32,
    pub avg_time: Duration,
    pub success_count: u32,
    pub fail_count: u32,
    pub success_rate: f64,
    pub recent_latencies: VecDeque<Duration>,
    pub last_probe_at: Option<Instant>,
}

impl PerformanceRecord {
    pub fn new() -> Self {
        Self {
            total_time: Duration::ZERO,
            count: 0,
            avg_time: Duration::ZERO,
            success_count: 0,
            fail_count: 0,
            success_rate: 0.0,
            recent_latencies: VecDeque::with_capacity(RECENT_LATENCY_WINDOW),
            last_probe_at: None,
        }
    }

    pub fn record(&mut self, latency: Duration, success: bool, now: Instant) {
        self.total_time += latency;
        self.count += 1;
        self.avg_time = self.total_time / self.count;

        if success {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
        self.success_rate =
            self.success_count as f64 / (self.success_count + self.fail_count) as f64;

        if self.recent_latencies.len() == RECENT_LATENCY_WINDOW {
            self.recent_latencies.pop_front();
        }
        self.recent_latencies.push_back(latency);

        self.last_probe_at = Some(now);
    }

    pub fn has_probes(&self) -> bool {
        self.count > 0
    }
}

impl Default for PerformanceRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_record_has_zero_rate() {
        let record = PerformanceRecord::new();
        assert!(!record.has_probes());
        assert_eq!(record.success_rate, 0.0);
        assert!(record.last_probe_at.is_none());
    }

    #[test]
    fn test_record_updates_running_stats() {
        let mut record = PerformanceRecord::new();
        let now = Instant::now();
        record.record(Duration::from_millis(100), true, now);
        record.record(Duration::from_millis(300), true, now);
        record.record(Duration::from_millis(500), false, now);

        assert_eq!(record.count, 3);
        assert_eq!(record.total_time, Duration::from_millis(900));
        assert_eq!(record.avg_time, Duration::from_millis(300));
        assert_eq!(record.success_count, 2);
        assert_eq!(record.fail_count, 1);
        assert!((record.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(record.last_probe_at, Some(now));
    }

    #[test]
    fn test_recent_latencies_keep_last_five() {
        let mut record = PerformanceRecord::new();
        let now = Instant::now();
        for ms in 1..=7u64 {
            record.record(Duration::from_millis(ms), true, now);
        }
        let recent: Vec<_> = record.recent_latencies.iter().map(|d| d.as_millis()).collect();
        assert_eq!(recent, vec![3, 4, 5, 6, 7]);
    }
}
