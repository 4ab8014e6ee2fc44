//! Per-region aggregation result

use serde::{Deserialize, Serialize};

/// Summary statistics for one region
///
/// Serializes to the response shape
/// `{"region", "avg_latency", "p95_latency", "avg_uptime", "breaches"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMetrics {
    /// Region code
    pub region: String,
    /// Mean latency in milliseconds, rounded to 2 decimals
    pub avg_latency: f64,
    /// 95th percentile latency (linear interpolation), rounded to 2 decimals
    pub p95_latency: f64,
    /// Mean uptime percentage, rounded to 2 decimals
    pub avg_uptime: f64,
    /// Number of records with latency strictly above the threshold
    pub breaches: u64,
}
