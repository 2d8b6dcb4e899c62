//! Shared probe statistics and endpoint ranking.
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::performance::PerformanceRecord;
use super::probe::{ProbeOutcome, Prober};
use super::ranking::compare_records;
use crate::endpoints::Endpoint;

#[derive(Debug, Default)]
struct TrackerState {
    records: HashMap<String, PerformanceRecord>,
    /// Names in the order they were first seen; the last ranking tie-break.
    order: Vec<String>,
}

impl TrackerState {
    fn remember(&mut self, name: &str) {
        if !self.order.iter().any(|n| n == name) {
            self.order.push(name.to_string());
        }
    }
}

/// Thread-safe store of per-endpoint performance records.
#[derive(Debug, Default)]
pub struct HealthTracker {
    state: RwLock<TrackerState>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one probe result into the endpoint's record, creating it on
    /// first use.
    pub fn record(&self, endpoint: &str, latency: Duration, success: bool) {
        self.record_at(endpoint, latency, success, Instant::now());
    }

    pub(crate) fn record_at(&self, endpoint: &str, latency: Duration, success: bool, now: Instant) {
        let mut state = self.write();
        state.remember(endpoint);
        state
            .records
            .entry(endpoint.to_string())
            .or_insert_with(PerformanceRecord::new)
            .record(latency, success, now);
    }

    pub fn get(&self, endpoint: &str) -> Option<PerformanceRecord> {
        self.read().records.get(endpoint).cloned()
    }

    /// Copies of all records in first-seen order.
    pub fn snapshot(&self) -> Vec<(String, PerformanceRecord)> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|name| state.records.get(name).map(|r| (name.clone(), r.clone())))
            .collect()
    }

    pub fn forget(&self, endpoint: &str) {
        let mut state = self.write();
        state.records.remove(endpoint);
        state.order.retain(|n| n != endpoint);
    }

    /// Sorts `names` best-first using the recorded statistics. Ties keep the
    /// order of `names`.
    pub fn rank(&self, names: &[String]) -> Vec<String> {
        let state = self.read();
        let mut ranked: Vec<String> = names.to_vec();
        ranked.sort_by(|a, b| compare_records(state.records.get(a), state.records.get(b)));
        ranked
    }

    /// Probes every endpoint with at most `concurrency` probes in flight,
    /// records each outcome and returns the names best-first.
    pub async fn rank_all(
        &self,
        prober: &dyn Prober,
        endpoints: &[Endpoint],
        test_url: &str,
        concurrency: usize,
    ) -> Vec<String> {
        {
            let mut state = self.write();
            for endpoint in endpoints {
                state.remember(&endpoint.name);
            }
        }

        info!(
            "Probing {} lines against {} ({} at a time)",
            endpoints.len(),
            test_url,
            concurrency.max(1)
        );

        let outcomes: Vec<(String, ProbeOutcome)> = stream::iter(endpoints.iter().cloned())
            .map(|endpoint| {
                let test_url = test_url.to_string();
                async move {
                    let outcome = prober.probe(&endpoint, &test_url).await;
                    (endpoint.name, outcome)
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        for (name, outcome) in &outcomes {
            self.record(name, outcome.latency, outcome.success);
        }

        let names: Vec<String> = endpoints.iter().map(|e| e.name.clone()).collect();
        let ranked = self.rank(&names);
        debug!("Ranking: {:?}", ranked);
        ranked
    }

    /// The top-ranked endpoint among everything recorded so far, if any of
    /// them has ever succeeded.
    pub fn best(&self) -> Option<String> {
        let order = self.read().order.clone();
        let top = self.rank(&order).into_iter().next()?;
        let succeeded = self
            .read()
            .records
            .get(&top)
            .is_some_and(|r| r.success_count > 0);
        succeeded.then_some(top)
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
