//! Latsight Core - Domain logic for per-region latency analytics
//!
//! This crate contains:
//! - **Domain types** - `TelemetryRecord`, `AnalyticsQuery`, `RegionMetrics` and their errors
//! - **Dataset** - the embedded telemetry corpus, validated once at load
//! - **Aggregator** - filter, group by region and reduce to summary statistics
//! - **Statistics** - mean, linear-interpolation percentile, half-to-even rounding
//! - **Configuration** - YAML-backed service configuration
//!
//! Nothing in this crate performs I/O at request time; the HTTP layer lives
//! in `latsight-server`.

pub mod aggregator;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod stats;

pub use aggregator::Aggregator;
pub use dataset::Dataset;
