//! Integration tests for latsight-server
//!
//! Binds a real listener on an ephemeral port, drives the server with
//! reqwest and verifies the HTTP contract end to end.

mod common;

mod test_analytics;
mod test_service;
