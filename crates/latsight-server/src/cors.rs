//! CORS headers for the analytics endpoint

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
};
use latsight_core::config::CorsConfig;

/// Methods advertised on preflight responses.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Cross-origin policy derived from [`CorsConfig`].
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: Option<HeaderValue>,
    max_age: HeaderValue,
}

impl CorsPolicy {
    /// Build the policy. Returns an error if the configured origin is not a
    /// valid header value.
    pub fn from_config(config: &CorsConfig) -> anyhow::Result<Self> {
        let allow_origin = if config.enabled {
            Some(HeaderValue::from_str(config.allow_origin.trim())?)
        } else {
            None
        };
        Ok(Self {
            allow_origin,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// A policy that adds no headers.
    pub fn disabled() -> Self {
        Self {
            allow_origin: None,
            max_age: HeaderValue::from(0u64),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.allow_origin.is_some()
    }

    /// Add the headers every cross-origin response carries.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(origin) = &self.allow_origin {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
    }

    /// Add preflight headers. Requested headers are echoed back; `*` is
    /// used when the client did not name any.
    pub fn apply_preflight(&self, request_headers: &HeaderMap, headers: &mut HeaderMap) {
        if !self.is_enabled() {
            return;
        }
        self.apply(headers);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        let allow_headers = request_headers
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}
