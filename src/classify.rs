//! Detection of the "message send" requests that trigger a webhook notification.
//!
//! Classification is a pure function of method and path. Rules live in a static table
//! and are evaluated in order; the first match wins.

use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    AgentMessage,
    GroupMessage,
    BatchMessage,
    Untracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: MessageKind,
    pub is_stream: bool,
}

impl Classification {
    pub const UNTRACKED: Self = Self {
        kind: MessageKind::Untracked,
        is_stream: false,
    };

    pub fn is_tracked(&self) -> bool {
        self.kind != MessageKind::Untracked
    }
}

struct Rule {
    method: Method,
    /// Path segments; `{id}` matches any single non-empty segment.
    pattern: &'static [&'static str],
    kind: MessageKind,
    /// Whether a trailing `/stream` segment is accepted.
    streamable: bool,
}

const ID: &str = "{id}";

static RULES: [Rule; 3] = [
    Rule {
        method: Method::POST,
        pattern: &["v1", "agents", ID, "messages"],
        kind: MessageKind::AgentMessage,
        streamable: true,
    },
    Rule {
        method: Method::POST,
        pattern: &["v1", "groups", ID, "messages"],
        kind: MessageKind::GroupMessage,
        streamable: true,
    },
    Rule {
        method: Method::POST,
        pattern: &["v1", "messages", "batches"],
        kind: MessageKind::BatchMessage,
        streamable: false,
    },
];

impl Rule {
    fn matches(&self, segments: &[&str]) -> bool {
        let tail = match segments.len() {
            n if n == self.pattern.len() => None,
            n if self.streamable && n == self.pattern.len() + 1 => segments.last(),
            _ => return false,
        };
        if tail.is_some_and(|t| *t != "stream") {
            return false;
        }
        self.pattern
            .iter()
            .zip(segments)
            .all(|(want, got)| if *want == ID { !got.is_empty() } else { want == got })
    }
}

/// Classifies a request by method and path (query string excluded).
pub fn classify(method: &Method, path: &str) -> Classification {
    let Some(rest) = path.strip_prefix('/') else {
        return Classification::UNTRACKED;
    };
    // At most one trailing slash is tolerated.
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let segments: Vec<&str> = rest.split('/').collect();

    RULES
        .iter()
        .find(|rule| rule.method == method && rule.matches(&segments))
        .map(|rule| Classification {
            kind: rule.kind,
            // Literal substring check on the whole path, not the matched segment.
            is_stream: rule.streamable && path.contains("/stream"),
        })
        .unwrap_or(Classification::UNTRACKED)
}
