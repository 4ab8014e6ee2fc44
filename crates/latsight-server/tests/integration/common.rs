//! Shared test helpers: start a server on `127.0.0.1:0` and stop it again.

use std::sync::Arc;

use latsight_core::config::Config;
use latsight_core::{Aggregator, Dataset};
use latsight_server::{serve, AppState};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    shutdown: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Cancel the accept loop and wait for it to exit cleanly.
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle
            .await
            .expect("server task panicked")
            .expect("server returned an error");
    }
}

/// Starts a server over the embedded corpus with the given configuration.
pub async fn start_server(config: Config) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let aggregator = Arc::new(Aggregator::new(
        Dataset::embedded().expect("embedded corpus"),
    ));
    let state = Arc::new(AppState::from_config(&config, aggregator).expect("build state"));

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(serve(listener, state, shutdown.clone()));

    TestServer {
        base_url: format!("http://{addr}"),
        shutdown,
        handle,
    }
}

/// Starts a server with the default configuration.
pub async fn start_default_server() -> TestServer {
    start_server(Config::default()).await
}
