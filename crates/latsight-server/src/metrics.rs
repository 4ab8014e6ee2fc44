//! Prometheus metrics registry for Latsight
//!
//! Counts HTTP requests per route and status, and records how long each
//! aggregation takes and how many regions it returned.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Counter: HTTP requests by (route, status)
    pub http_requests_total: IntCounterVec,
    /// Histogram: time spent in `Aggregator::compute`, in seconds
    pub aggregation_duration_seconds: Histogram,
    /// Histogram: number of regions returned per analytics query
    pub aggregation_regions_matched: Histogram,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("latsight".to_string()), None)?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests handled"),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let aggregation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "aggregation_duration_seconds",
                "Time spent computing per-region metrics",
            )
            .buckets(vec![0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
        )?;
        registry.register(Box::new(aggregation_duration_seconds.clone()))?;

        let aggregation_regions_matched = Histogram::with_opts(
            HistogramOpts::new(
                "aggregation_regions_matched",
                "Regions returned per analytics query",
            )
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0]),
        )?;
        registry.register(Box::new(aggregation_regions_matched.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            aggregation_duration_seconds,
            aggregation_regions_matched,
        })
    }

    /// Record a handled HTTP request.
    pub fn record_request(&self, route: &str, status: u16) {
        self.http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record one aggregation run.
    pub fn observe_aggregation(&self, duration_secs: f64, regions_matched: usize) {
        self.aggregation_duration_seconds.observe(duration_secs);
        self.aggregation_regions_matched
            .observe(regions_matched as f64);
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
