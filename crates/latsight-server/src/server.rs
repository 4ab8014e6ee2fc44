//! HTTP server for the analytics API
//!
//! Routes:
//! - `POST /analytics` computes per-region metrics for a JSON query
//! - `OPTIONS /analytics` answers CORS preflight requests
//! - `GET /` is the health check
//! - `GET /metrics` serves Prometheus text exposition (when enabled)

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use latsight_core::config::Config;
use latsight_core::domain::AnalyticsQuery;
use latsight_core::Aggregator;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cors::{CorsPolicy, ALLOWED_METHODS};
use crate::error::ApiError;
use crate::metrics::MetricsRegistry;

pub const ANALYTICS_PATH: &str = "/analytics";
pub const HEALTH_PATH: &str = "/";
pub const METRICS_PATH: &str = "/metrics";

const JSON_CONTENT_TYPE: &str = "application/json";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Everything a request handler needs. Immutable once built.
pub struct AppState {
    aggregator: Arc<Aggregator>,
    metrics: Option<MetricsRegistry>,
    cors: CorsPolicy,
    max_body_bytes: usize,
}

impl AppState {
    /// Create state with no metrics registry.
    pub fn new(aggregator: Arc<Aggregator>, cors: CorsPolicy, max_body_bytes: usize) -> Self {
        Self {
            aggregator,
            metrics: None,
            cors,
            max_body_bytes,
        }
    }

    /// Attach a metrics registry; enables `GET /metrics`.
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build state from the service configuration.
    pub fn from_config(config: &Config, aggregator: Arc<Aggregator>) -> anyhow::Result<Self> {
        let cors = CorsPolicy::from_config(&config.cors)?;
        let state = Self::new(aggregator, cors, config.server.max_body_bytes);
        if config.metrics.enabled {
            Ok(state.with_metrics(MetricsRegistry::new()?))
        } else {
            Ok(state)
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_ref()
    }
}

/// HTTP server that serves the analytics API on a configurable address.
pub struct ApiServer {
    state: Arc<AppState>,
    addr: SocketAddr,
}

impl ApiServer {
    /// Creates a new `ApiServer`.
    ///
    /// # Arguments
    /// * `state` - Shared handler state
    /// * `endpoint` - Address to bind, e.g. `"127.0.0.1:8000"`
    pub fn new(state: Arc<AppState>, endpoint: &str) -> anyhow::Result<Self> {
        let addr: SocketAddr = endpoint.parse()?;
        Ok(Self { state, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the listener and serves until the cancellation token fires.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        serve(listener, Arc::clone(&self.state), shutdown).await
    }
}

/// Accept connections on an already-bound listener until `shutdown` fires.
///
/// Each connection is driven on its own task.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "Analytics server listening");

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle_request(req, &state).await) }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %e, peer = %peer, "HTTP connection error");
                    }
                });
            }
            _ = shutdown.cancelled() => {
                info!("Analytics server shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Handle a single HTTP request.
///
/// Never fails: every error is rendered as a JSON `{"detail": ...}` body
/// with the matching status code.
pub async fn handle_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = match route(req, state).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    };

    if path == ANALYTICS_PATH && method != Method::OPTIONS {
        state.cors.apply(response.headers_mut());
    }

    let status = response.status();
    if let Some(metrics) = &state.metrics {
        metrics.record_request(route_label(&path), status.as_u16());
    }
    debug!(method = %method, path = %path, status = status.as_u16(), "Handled request");

    response
}

async fn route<B>(req: Request<B>, state: &AppState) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match (req.method(), req.uri().path()) {
        (&Method::POST, ANALYTICS_PATH) => analytics(req, state).await,
        (&Method::OPTIONS, ANALYTICS_PATH) => Ok(preflight(req.headers(), state)),
        (_, ANALYTICS_PATH) => Err(ApiError::MethodNotAllowed {
            allow: ALLOWED_METHODS,
        }),
        (&Method::GET, HEALTH_PATH) => Ok(json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "ok" }),
        )),
        (_, HEALTH_PATH) => Err(ApiError::MethodNotAllowed { allow: "GET" }),
        (&Method::GET, METRICS_PATH) if state.metrics.is_some() => metrics_response(state),
        (_, METRICS_PATH) if state.metrics.is_some() => {
            Err(ApiError::MethodNotAllowed { allow: "GET" })
        }
        _ => Err(ApiError::NotFound),
    }
}

async fn analytics<B>(req: Request<B>, state: &AppState) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body = read_body(req.into_body(), state.max_body_bytes).await?;
    let query = AnalyticsQuery::parse(&body)?;

    let started = Instant::now();
    let results = state.aggregator.compute_query(&query);
    let elapsed = started.elapsed().as_secs_f64();

    if let Some(metrics) = &state.metrics {
        metrics.observe_aggregation(elapsed, results.len());
    }
    debug!(
        regions = query.regions.len(),
        threshold_ms = query.threshold_ms,
        matched = results.len(),
        "Analytics query served"
    );

    Ok(json_response(StatusCode::OK, &results))
}

fn preflight(request_headers: &HeaderMap, state: &AppState) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    state
        .cors
        .apply_preflight(request_headers, response.headers_mut());
    response
}

fn metrics_response(state: &AppState) -> Result<Response<Full<Bytes>>, ApiError> {
    let metrics = state.metrics.as_ref().ok_or(ApiError::NotFound)?;
    let body = metrics
        .encode()
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {e}")))?;

    let mut response = Response::new(Full::new(Bytes::from(body)));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
    );
    Ok(response)
}

/// Collect the body, refusing anything larger than `limit` bytes.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ApiError::BodyRead(e.to_string())),
    }
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            response
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize response body");
            let mut response = Response::new(Full::new(Bytes::from_static(
                b"{\"detail\":\"internal error\"}",
            )));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            response
        }
    }
}

fn error_response(err: &ApiError) -> Response<Full<Bytes>> {
    let status = err.status();
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        debug!(error = %err, status = status.as_u16(), "Request rejected");
    }

    let mut response = json_response(status, &err.body());
    if let ApiError::MethodNotAllowed { allow } = err {
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static(*allow));
    }
    response
}

/// Bounded label set for the request counter.
fn route_label(path: &str) -> &'static str {
    match path {
        ANALYTICS_PATH => ANALYTICS_PATH,
        HEALTH_PATH => HEALTH_PATH,
        METRICS_PATH => METRICS_PATH,
        _ => "unmatched",
    }
}
