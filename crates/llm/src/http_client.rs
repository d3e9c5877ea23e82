//! HTTP Client Factory
//!
//! Provides the shared `reqwest::Client` used by all backend and search
//! calls.

use std::time::Duration;

/// Build a `reqwest::Client` for backend calls.
///
/// A connect timeout guards against unreachable local endpoints (Ollama,
/// vLLM). No overall request timeout is set: research calls can
/// legitimately run long, and the only bounded wait in the system is the
/// background-job poll loop, which does its own accounting.
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("research-pilot/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build reqwest client")
}
