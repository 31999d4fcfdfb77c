//! `reqwest`-backed [`Transport`].
//!
//! Paths are joined onto a configured base URL. `GET` and `HEAD` send the
//! body as query parameters, `FORM_DATA` is posted as a url-encoded form and
//! every other method sends the body as JSON. Non-2xx answers come back with
//! the application-error flag set and the decoded body as payload.

use std::time::Duration;

use futures::future::BoxFuture;
use lifecycle_fetch_core::environment::Transport;
use lifecycle_fetch_core::transport::{
    Body, Headers, Method, ResponseMeta, TransportError, TransportRequest, TransportResponse,
};
use reqwest::{Client, Url};
use serde_json::Value;

/// Environment variable holding the base URL
pub const BASE_URL_VAR: &str = "FETCH_BASE_URL";

/// Environment variable holding the request timeout in seconds
pub const TIMEOUT_VAR: &str = "FETCH_TIMEOUT_SECS";

/// Settings for [`HttpTransport`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Prefix for relative paths
    pub base_url: String,
    /// Per-request timeout enforced by the client
    pub timeout: Option<Duration>,
    /// Headers sent with every request (request headers win)
    pub default_headers: Headers,
}

impl HttpTransportConfig {
    /// Create a config for `base_url` with no timeout
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Read `FETCH_BASE_URL` and `FETCH_TIMEOUT_SECS` from the environment
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the base URL is not set
    /// or the timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source
    ///
    /// # Errors
    ///
    /// Same as [`HttpTransportConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransportError> {
        let base_url = lookup(BASE_URL_VAR)
            .ok_or_else(|| TransportError::InvalidRequest(format!("{BASE_URL_VAR} is not set")))?;

        let mut config = Self::new(base_url);
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                TransportError::InvalidRequest(format!("{TIMEOUT_VAR} must be whole seconds, got {raw:?}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// HTTP transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Create a transport
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a transport configured from the environment
    ///
    /// # Errors
    ///
    /// See [`HttpTransportConfig::from_env`] and [`HttpTransport::new`].
    pub fn from_env() -> Result<Self, TransportError> {
        Self::new(HttpTransportConfig::from_env()?)
    }

    /// The settings in use
    #[must_use]
    pub const fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Resolve `path` against the base URL
    ///
    /// Absolute URLs are used as they are.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the result is not a valid URL.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&raw).map_err(|e| TransportError::InvalidRequest(format!("{raw}: {e}")))
    }

    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.path)?;

        let mut builder = match request.method {
            Method::Delete => self.client.delete(url),
            Method::FormData | Method::Post => self.client.post(url),
            Method::Get => self.client.get(url),
            Method::Head => self.client.head(url),
            Method::Patch => self.client.patch(url),
            Method::Put => self.client.put(url),
            Method::Trace => self.client.request(reqwest::Method::TRACE, url),
        };

        for (name, value) in self.config.default_headers.iter().chain(&request.headers) {
            builder = builder.header(name, value);
        }

        if !request.body.is_empty() {
            builder = match request.method {
                method if method.body_in_query() => builder.query(&flatten(&request.body)),
                Method::FormData => builder.form(&flatten(&request.body)),
                _ => builder.json(&request.body),
            };
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let meta = ResponseMeta {
            url: response.url().to_string(),
            headers: response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        };

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::ResponseParseFailed(e.to_string()))?;
        let payload = decode(&text)?;

        tracing::debug!(url = %meta.url, status = status.as_u16(), "HTTP response received");

        let response = if status.is_success() {
            TransportResponse::ok(status.as_u16(), payload)
        } else {
            TransportResponse::rejected(status.as_u16(), payload)
        };
        Ok(response.with_meta(meta))
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        Box::pin(self.perform(request))
    }
}

/// Flatten a body into string pairs for query strings and forms
fn flatten(body: &Body) -> Vec<(String, String)> {
    body.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Decode a response body: empty is `null`, anything else must be JSON
fn decode(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| TransportError::ResponseParseFailed(e.to_string()))
}
