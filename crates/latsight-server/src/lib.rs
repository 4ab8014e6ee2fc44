//! Latsight Server - HTTP surface for per-region latency analytics
//!
//! Provides:
//! - `ApiServer`: hyper HTTP/1 server with `/analytics`, `/` and `/metrics`
//! - `AppState`: shared, immutable handler state (aggregator, CORS, metrics)
//! - `CorsPolicy`: cross-origin headers for the analytics endpoint
//! - `MetricsRegistry`: Prometheus counters and histograms
//! - `ApiError`: client-facing errors mapped to HTTP status codes

pub mod cors;
pub mod error;
pub mod metrics;
pub mod server;

pub use cors::CorsPolicy;
pub use error::ApiError;
pub use metrics::MetricsRegistry;
pub use server::{handle_request, serve, ApiServer, AppState};
