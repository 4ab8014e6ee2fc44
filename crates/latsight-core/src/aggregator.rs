//! Per-region aggregation over the telemetry corpus.
//!
//! The aggregator filters records by the requested regions, partitions them
//! by region and reduces each partition to a [`RegionMetrics`]. It holds
//! only immutable data, so a single instance can be shared across tasks
//! behind an `Arc` without locking.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::dataset::Dataset;
use crate::domain::{AnalyticsQuery, RegionMetrics, TelemetryRecord};
use crate::stats::{mean, percentile_linear, round2};

/// Quantile reported as `p95_latency`.
pub const P95: f64 = 0.95;

/// Computes per-region latency and uptime metrics.
#[derive(Debug, Clone)]
pub struct Aggregator {
    dataset: Dataset,
}

impl Aggregator {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Compute metrics for every requested region that has at least one
    /// record.
    ///
    /// Unknown regions and duplicates in `regions` are ignored. Output is
    /// sorted ascending by region code. A record breaches when its latency
    /// is strictly greater than `threshold_ms`.
    pub fn compute<S: AsRef<str>>(&self, regions: &[S], threshold_ms: f64) -> Vec<RegionMetrics> {
        let wanted: HashSet<&str> = regions.iter().map(AsRef::as_ref).collect();

        let mut groups: BTreeMap<&str, Vec<&TelemetryRecord>> = BTreeMap::new();
        for record in self.dataset.records() {
            if wanted.contains(record.region()) {
                groups.entry(record.region()).or_default().push(record);
            }
        }

        let results: Vec<RegionMetrics> = groups
            .into_iter()
            .filter_map(|(region, records)| summarize(region, &records, threshold_ms))
            .collect();

        debug!(
            requested = wanted.len(),
            matched = results.len(),
            threshold_ms,
            "Aggregation complete"
        );

        results
    }

    /// Compute metrics for a validated query.
    pub fn compute_query(&self, query: &AnalyticsQuery) -> Vec<RegionMetrics> {
        self.compute(&query.regions, query.threshold_ms)
    }
}

/// Reduce one region's records. Returns `None` for an empty group.
fn summarize(region: &str, records: &[&TelemetryRecord], threshold_ms: f64) -> Option<RegionMetrics> {
    let latencies: Vec<f64> = records.iter().map(|r| r.latency_ms()).collect();
    let uptimes: Vec<f64> = records.iter().map(|r| r.uptime_pct()).collect();

    let avg_latency = mean(&latencies)?;
    let p95_latency = percentile_linear(&latencies, P95)?;
    let avg_uptime = mean(&uptimes)?;
    let breaches = latencies.iter().filter(|&&l| l > threshold_ms).count() as u64;

    Some(RegionMetrics {
        region: region.to_string(),
        avg_latency: round2(avg_latency),
        p95_latency: round2(p95_latency),
        avg_uptime: round2(avg_uptime),
        breaches,
    })
}
