//! Domain entities
//!
//! This module contains the core domain types for Latsight:
//! - Telemetry records loaded from the corpus
//! - Analytics queries validated from request bodies
//! - Per-region metrics produced by the aggregator
//! - Domain-specific error types

pub mod errors;
pub mod metrics;
pub mod query;
pub mod record;

// Re-export commonly used types
pub use errors::{DatasetError, DomainError};
pub use metrics::RegionMetrics;
pub use query::AnalyticsQuery;
pub use record::TelemetryRecord;
