//! Telemetry corpus
//!
//! The corpus ships inside the binary (`data/telemetry.json`) so the service
//! never touches the filesystem at request time. It is parsed and validated
//! exactly once, at startup; a malformed corpus is a startup failure.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::domain::{DatasetError, TelemetryRecord};

/// The embedded telemetry corpus, as JSON.
pub const EMBEDDED_CORPUS: &str = include_str!("../data/telemetry.json");

/// A validated, immutable set of telemetry records
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<TelemetryRecord>,
}

impl Dataset {
    /// Load the corpus compiled into the binary.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json(EMBEDDED_CORPUS)
    }

    /// Parse a JSON array of records and validate every entry.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let records: Vec<TelemetryRecord> =
            serde_json::from_str(json).map_err(|e| DatasetError::Parse(e.to_string()))?;
        Self::from_records(records)
    }

    /// Read a corpus from a file on disk. Only used at startup.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Build a dataset from already-constructed records.
    pub fn from_records(records: Vec<TelemetryRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        for (index, record) in records.iter().enumerate() {
            record
                .check()
                .map_err(|(field, reason)| DatasetError::InvalidRecord {
                    index,
                    field,
                    reason,
                })?;
        }

        debug!(records = records.len(), "Telemetry corpus validated");
        Ok(Self { records })
    }

    /// All records, in corpus order.
    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no records. Always false once constructed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct region codes, ascending.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
