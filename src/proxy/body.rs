use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method},
};
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;

/// A JSON request body read once into memory.
///
/// `canonical` is what goes upstream; `value` is the immutable snapshot the notifier
/// reports. Both are cheap to share after the single read.
#[derive(Debug, Clone)]
pub struct CapturedJson {
    pub value: Value,
    pub canonical: Bytes,
}

/// The request body as it will be forwarded upstream.
#[derive(Debug, Clone)]
pub enum ExtractedBody {
    /// `GET`/`HEAD`, or a JSON request with an empty body.
    Empty,
    Json(CapturedJson),
    /// `multipart/form-data`, forwarded byte-for-byte with its boundary-carrying content type.
    Form(Bytes),
    Raw(Bytes),
}

impl ExtractedBody {
    /// Splits into the bytes to forward and the JSON snapshot kept for the notifier.
    pub fn into_parts(self) -> (Option<Bytes>, Option<Value>) {
        match self {
            ExtractedBody::Empty => (None, None),
            ExtractedBody::Json(captured) => (Some(captured.canonical), Some(captured.value)),
            ExtractedBody::Form(bytes) | ExtractedBody::Raw(bytes) => (Some(bytes), None),
        }
    }
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reads the inbound body once and branches on its declared content type.
pub async fn extract_body(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<ExtractedBody, AppError> {
    if *method == Method::GET || *method == Method::HEAD {
        return Ok(ExtractedBody::Empty);
    }

    let content_type = content_type(headers);
    let bytes = to_bytes(body, usize::MAX).await?;

    if content_type.starts_with("application/json") {
        if bytes.is_empty() {
            debug!("JSON content type with empty body; nothing to capture");
            return Ok(ExtractedBody::Empty);
        }
        let value: Value = serde_json::from_slice(&bytes).map_err(AppError::MalformedBody)?;
        let canonical = serde_json::to_vec(&value).map_err(AppError::MalformedBody)?;
        debug!(size = bytes.len(), "Captured JSON request body");
        return Ok(ExtractedBody::Json(CapturedJson {
            value,
            canonical: Bytes::from(canonical),
        }));
    }

    if content_type.starts_with("multipart/form-data") {
        debug!(size = bytes.len(), "Passing multipart body through");
        return Ok(ExtractedBody::Form(bytes));
    }

    Ok(ExtractedBody::Raw(bytes))
}
