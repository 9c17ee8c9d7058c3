use axum::http::{header, HeaderMap, HeaderValue};
use tracing::debug;

/// Request-framing headers that are invalid once the call is re-issued upstream.
const STRIPPED_HEADERS: [header::HeaderName; 3] =
    [header::HOST, header::CONNECTION, header::CONTENT_LENGTH];

/// Prepares inbound headers for the upstream call.
///
/// Framing headers and any caller-supplied `Authorization` are dropped; the configured
/// credential, if any, is injected in its place. All other headers pass through untouched.
pub fn sanitize_headers(mut headers: HeaderMap, authorization: Option<&HeaderValue>) -> HeaderMap {
    for name in &STRIPPED_HEADERS {
        headers.remove(name);
    }

    if headers.remove(header::AUTHORIZATION).is_some() {
        debug!("Dropped caller-supplied authorization header");
    }
    if let Some(value) = authorization {
        headers.insert(header::AUTHORIZATION, value.clone());
    }

    headers
}
