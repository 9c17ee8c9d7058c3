//! Transparent proxy in front of an agent API.
//!
//! Requests are forwarded verbatim apart from credential centralization. Successful
//! "message send" calls additionally trigger a detached webhook notification that can
//! never affect the response returned to the caller.

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod classify;
pub mod config;
pub mod context;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod proxy;
pub mod webhook;

pub use crate::{config::AppConfig, error::AppError};

/// Builds the application router. All paths and methods fall through to the proxy.
pub fn build_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .fallback(handlers::proxy_request)
        .with_state(config)
        .layer(middleware::from_fn(cors::cors))
        .layer(TraceLayer::new_for_http())
}
