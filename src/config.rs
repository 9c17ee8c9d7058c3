use std::env;

use dotenv::dotenv;
use http::HeaderValue;

use crate::error::AppError;

const DEFAULT_PORT: u16 = 8283;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Immutable process configuration, built once at startup and shared through router state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub host: String,
    /// Upstream base URL without a trailing slash.
    pub upstream_url: String,
    /// Pre-built `Bearer <key>` value; `None` when no key is configured.
    pub upstream_authorization: Option<HeaderValue>,
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// Pre-built `X-Webhook-Secret` value, marked sensitive.
    pub secret: Option<HeaderValue>,
}

impl AppConfig {
    /// Reads the configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let upstream_url = get("LETTA_BASE_URL")
            .ok_or_else(|| AppError::Configuration("LETTA_BASE_URL must be set".into()))?;
        let upstream_url = upstream_url.trim().trim_end_matches('/').to_string();
        if !(upstream_url.starts_with("http://") || upstream_url.starts_with("https://")) {
            return Err(AppError::Configuration(format!(
                "LETTA_BASE_URL must be an http(s) URL, got {upstream_url:?}"
            )));
        }

        let upstream_authorization = get("LETTA_PASSWORD")
            .map(|key| {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", key.trim()))
                    .map_err(|_| {
                        AppError::Configuration(
                            "LETTA_PASSWORD contains characters not allowed in a header".into(),
                        )
                    })?;
                value.set_sensitive(true);
                Ok::<_, AppError>(value)
            })
            .transpose()?;

        let webhook_secret = get("WEBHOOK_SECRET")
            .map(|secret| {
                let mut value = HeaderValue::from_str(&secret).map_err(|_| {
                    AppError::Configuration(
                        "WEBHOOK_SECRET contains characters not allowed in a header".into(),
                    )
                })?;
                value.set_sensitive(true);
                Ok::<_, AppError>(value)
            })
            .transpose()?;

        let webhook = get("WEBHOOK_URL").map(|url| WebhookConfig {
            url: url.trim().to_string(),
            secret: webhook_secret,
        });

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::Configuration(format!("PORT must be a number, got {raw:?}"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            upstream_url,
            upstream_authorization,
            webhook,
        })
    }
}
