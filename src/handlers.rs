use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{config::AppConfig, proxy::proxy_request_to_upstream};

/// Catch-all handler: every non-`OPTIONS` request is forwarded upstream.
pub async fn proxy_request(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
) -> Response {
    match proxy_request_to_upstream(config, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Proxy error: {}", e);
            e.into_response()
        }
    }
}
