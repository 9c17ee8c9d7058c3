use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, Response, StatusCode},
};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    config::AppConfig,
    context::RequestContext,
    error::AppError,
    webhook::{self, Notification, UpstreamOutcome},
};

mod body;
mod client;
mod headers;

pub use body::{extract_body, CapturedJson, ExtractedBody};
pub use client::CLIENT;
pub use headers::sanitize_headers;

/// Runs one request through the pipeline: classify, sanitize, capture, forward, relay.
///
/// A notification is spawned, never awaited, when the request is tracked, upstream
/// answered 2xx and a JSON body was captured.
pub async fn proxy_request_to_upstream(
    config: Arc<AppConfig>,
    request: Request<Body>,
) -> Result<Response<Body>, AppError> {
    let (parts, body) = request.into_parts();
    let inbound_headers = parts.headers;
    let context = RequestContext::new(parts.method, &parts.uri);

    let span = info_span!(
        "proxy",
        request_id = %context.id,
        method = %context.method,
        path = %context.path,
    );

    run_pipeline(config, context, inbound_headers, body)
        .instrument(span)
        .await
}

async fn run_pipeline(
    config: Arc<AppConfig>,
    context: RequestContext,
    inbound_headers: HeaderMap,
    body: Body,
) -> Result<Response<Body>, AppError> {
    debug!(classification = ?context.classification, "Classified request");

    let extracted = extract_body(&context.method, &inbound_headers, body).await?;
    let (forward_body, captured) = extracted.into_parts();
    let headers = sanitize_headers(inbound_headers, config.upstream_authorization.as_ref());

    let upstream = forward(&config, &context, headers, forward_body).await?;
    let status = upstream.status();
    info!(status = %status, "Upstream responded");

    let notify = match (&config.webhook, captured) {
        (Some(webhook), Some(request_body))
            if context.classification.is_tracked() && status.is_success() =>
        {
            Some((webhook.clone(), request_body))
        }
        _ => None,
    };

    let Some((webhook_config, request_body)) = notify else {
        return Ok(relay_streaming(upstream));
    };

    if context.classification.is_stream {
        webhook::dispatch(
            webhook_config,
            Notification {
                context,
                request_body,
                outcome: UpstreamOutcome::Streaming,
            },
        );
        return Ok(relay_streaming(upstream));
    }

    let headers = relay_headers(upstream.headers());
    let bytes = upstream.bytes().await?;
    webhook::dispatch(
        webhook_config,
        Notification {
            context,
            request_body,
            outcome: UpstreamOutcome::Buffered(bytes.clone()),
        },
    );
    Ok(build_response(status, headers, Body::from(bytes)))
}

/// Issues the upstream call to `<base><path>?<query>` with the sanitized headers.
async fn forward(
    config: &AppConfig,
    context: &RequestContext,
    headers: HeaderMap,
    body: Option<Bytes>,
) -> Result<reqwest::Response, AppError> {
    let url = format!("{}{}", config.upstream_url, context.path_and_query);
    debug!(url = %url, "Forwarding request upstream");

    let mut request = CLIENT
        .request(context.method.clone(), url)
        .headers(headers);
    if let Some(body) = body {
        request = request.body(body);
    }

    request.send().await.map_err(|e| {
        error!(error = %e, "Upstream request failed");
        AppError::UpstreamUnavailable(e)
    })
}

/// Copies upstream headers minus the hop-by-hop framing ones the server regenerates.
fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    headers.remove(header::CONNECTION);
    headers.remove(header::TRANSFER_ENCODING);
    headers
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Relays the upstream response as a byte stream without buffering it.
fn relay_streaming(upstream: reqwest::Response) -> Response<Body> {
    let status = upstream.status();
    let headers = relay_headers(upstream.headers());

    let stream = upstream.bytes_stream().map(|result| {
        result.map_err(|e| {
            error!("Upstream stream error: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e)
        })
    });

    build_response(status, headers, Body::from_stream(stream))
}
