//! Analytics query (request body) validation
//!
//! The HTTP layer hands the raw request body to [`AnalyticsQuery::parse`],
//! which either yields a fully typed query or a [`DomainError`] describing
//! what was wrong. The aggregator is only ever called with a parsed query.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;

/// A validated request for per-region metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    /// Region codes to include; duplicates and unknown codes are tolerated
    pub regions: Vec<String>,
    /// Latencies strictly above this value count as breaches. Always a
    /// whole number; stored as `f64` so integers beyond `i64` still fit.
    pub threshold_ms: f64,
}

impl AnalyticsQuery {
    /// Create a query from already-typed values
    pub fn new<I, S>(regions: I, threshold_ms: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            threshold_ms,
        }
    }

    /// Parse and validate a JSON request body.
    ///
    /// Extra fields are ignored. `regions` must be an array of strings.
    /// `threshold_ms` must be a whole number: `150`, `150.0` and integers
    /// wider than `i64` are accepted, as are strings holding an integer
    /// (`"150"`). Fractions, booleans and `null` are rejected.
    pub fn parse(body: &[u8]) -> Result<Self, DomainError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| DomainError::MalformedJson(e.to_string()))?;

        let object = value.as_object().ok_or_else(|| {
            DomainError::ValidationFailed("request body must be a JSON object".to_string())
        })?;

        let regions = match object.get("regions") {
            None => return Err(DomainError::MissingField("regions".to_string())),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| DomainError::InvalidField {
                            field: format!("regions[{i}]"),
                            reason: format!("expected a string, got {}", json_type(item)),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(DomainError::InvalidField {
                    field: "regions".to_string(),
                    reason: format!("expected an array of strings, got {}", json_type(other)),
                })
            }
        };

        let threshold_ms = match object.get("threshold_ms") {
            None => return Err(DomainError::MissingField("threshold_ms".to_string())),
            Some(value) => whole_number(value).ok_or_else(|| DomainError::InvalidField {
                field: "threshold_ms".to_string(),
                reason: format!("expected an integer, got {}", describe_number(value)),
            })?,
        };

        Ok(Self {
            regions,
            threshold_ms,
        })
    }
}

/// Interpret `value` as an integer, returning it as `f64`.
fn whole_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0),
        Value::String(s) => integer_string(s),
        _ => None,
    }
}

/// Integer text, optionally padded with whitespace or followed by a
/// zero-only fraction (`"150"`, `" 150 "`, `"150.00"`).
fn integer_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let digits = match trimmed.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        Some(_) => return None,
        None => trimmed,
    };
    digits.parse::<i128>().ok().map(|n| n as f64)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe_number(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("the number {n}"),
        other => json_type(other).to_string(),
    }
}
