//! Domain error types
//!
//! This module defines the errors raised while validating analytics queries
//! and while loading the telemetry corpus.

use thiserror::Error;

/// Errors that can occur while validating an incoming analytics query
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The request body is not valid JSON
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    /// A required field is absent from the request body
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field is present but has the wrong type or an invalid value
    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        /// Name of the offending field
        field: String,
        /// Human-readable explanation
        reason: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised while loading or validating the telemetry corpus
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    /// The corpus could not be parsed as an array of records
    #[error("Failed to parse telemetry corpus: {0}")]
    Parse(String),

    /// The corpus parsed but contains no records
    #[error("Telemetry corpus is empty")]
    Empty,

    /// A record failed validation
    #[error("Invalid record #{index} ({field}): {reason}")]
    InvalidRecord {
        /// Zero-based position of the record in the corpus
        index: usize,
        /// Field that failed validation
        field: &'static str,
        /// Human-readable explanation
        reason: String,
    },
}
