use std::cmp::Ordering;

use super::performance::PerformanceRecord;

/// Orders two endpoints' records best-first.
///
/// Endpoints that were never probed sort last. Otherwise the higher success
/// rate wins, then the lower average latency, then the more recent probe.
/// Equal records compare as `Equal` so a stable sort keeps caller order.
pub fn compare_records(a: Option<&PerformanceRecord>, b: Option<&PerformanceRecord>) -> Ordering {
    let a = a.filter(|r| r.has_probes());
    let b = b.filter(|r| r.has_probes());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => b
            .success_rate
            .total_cmp(&a.success_rate)
            .then_with(|| a.avg_time.cmp(&b.avg_time))
            .then_with(|| b.last_probe_at.cmp(&a.last_probe_at)),
    }
}
