use once_cell::sync::Lazy;
use std::time::Duration;

/// Shared HTTP client for upstream and webhook calls.
///
/// No overall request timeout is set; a hung upstream call hangs the caller's request.
/// Redirects are followed with reqwest's default policy.
pub static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(32)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .expect("Failed to create HTTP client")
});
