//! Telemetry record entity
//!
//! A `TelemetryRecord` is a single latency/uptime observation for one
//! service in one region. Records are loaded once from the corpus and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};

/// One latency/uptime observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    region: String,
    service: String,
    latency_ms: f64,
    uptime_pct: f64,
    timestamp: u64,
}

impl TelemetryRecord {
    /// Create a new record
    pub fn new(
        region: impl Into<String>,
        service: impl Into<String>,
        latency_ms: f64,
        uptime_pct: f64,
        timestamp: u64,
    ) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
            latency_ms,
            uptime_pct,
            timestamp,
        }
    }

    /// Region code, e.g. `apac`
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Service name (informational only)
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Observed latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// Observed uptime percentage
    pub fn uptime_pct(&self) -> f64 {
        self.uptime_pct
    }

    /// Date-like timestamp (`YYYYMMDD`)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Check the record's invariants.
    ///
    /// Returns the offending field name and a reason on failure.
    pub fn check(&self) -> Result<(), (&'static str, String)> {
        if self.region.is_empty() {
            return Err(("region", "must not be empty".to_string()));
        }
        if !self
            .region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err((
                "region",
                format!("'{}' is not a lowercase region code", self.region),
            ));
        }
        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            return Err((
                "latency_ms",
                format!("must be a finite non-negative number, got {}", self.latency_ms),
            ));
        }
        if !self.uptime_pct.is_finite() || !(0.0..=100.0).contains(&self.uptime_pct) {
            return Err((
                "uptime_pct",
                format!("must be within 0..=100, got {}", self.uptime_pct),
            ));
        }
        Ok(())
    }
}
