use axum::http::Method;
use uuid::Uuid;

use crate::classify::{classify, Classification};

/// Request-scoped facts computed before forwarding and reused by the notifier.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: Uuid,
    pub method: Method,
    /// Path without the query string, as reported to the webhook.
    pub path: String,
    /// Path plus `?query`, as sent upstream.
    pub path_and_query: String,
    pub classification: Classification,
}

impl RequestContext {
    pub fn new(method: Method, uri: &axum::http::Uri) -> Self {
        let path = uri.path().to_string();
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| path.clone());
        let classification = classify(&method, &path);

        Self {
            id: Uuid::new_v4(),
            method,
            path,
            path_and_query,
            classification,
        }
    }
}
