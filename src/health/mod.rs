//! Endpoint health tracking.
//!
//! Each parse line is probed against a canonical video page. Outcomes are
//! folded into a [`PerformanceRecord`] per line and the lines are ranked by
//! success rate, then latency, then recency.
pub mod performance;
pub mod probe;
pub mod ranking;
pub mod tracker;

pub use performance::PerformanceRecord;
pub use probe::{HttpProber, ProbeOutcome, Prober};
pub use tracker::HealthTracker;
