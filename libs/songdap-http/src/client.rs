//! Traced HTTP transport.
//!
//! [`TracedClient`] wraps a `reqwest::Client` configured with the uniform request
//! timeout and a cookie store, so the HttpOnly auth cookies set by the backend
//! ride along on every call without the client ever reading them.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{field, Instrument, Level};
use url::Url;

use crate::error::HttpError;
use crate::request::{ApiRequest, ApiResponse};
use crate::simple_otel;

/// Port for sending a single request with no retry or auth handling.
///
/// Implementations return `Err` only when no HTTP response was obtained;
/// every status code, including 401/403, comes back as `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError>;
}

/// Settings for building the underlying reqwest client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Cookies seeded into the jar for `base_url`, in `Set-Cookie` syntax.
    pub cookies: Vec<String>,
    pub user_agent: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(15),
            cookies: Vec::new(),
            user_agent: None,
        }
    }
}

/// A traced HTTP client: one `outgoing_http` span and a fresh `traceparent`
/// header per request.
#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for TracedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl TracedClient {
    /// Wrap an existing reqwest client.
    pub fn new(inner: reqwest::Client, base_url: &str) -> Result<Self, HttpError> {
        let base_url =
            Url::parse(base_url).map_err(|e| HttpError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self { inner, base_url })
    }

    /// Build a client with timeout, cookie store and seeded cookies.
    pub fn from_options(options: &ClientOptions) -> Result<Self, HttpError> {
        let base_url = Url::parse(&options.base_url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", options.base_url)))?;

        let jar = reqwest::cookie::Jar::default();
        for cookie in &options.cookies {
            jar.add_cookie_str(cookie, &base_url);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .cookie_provider(Arc::new(jar));
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { inner, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying reqwest::Client for advanced usage
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Absolute URL for `request`: base URL path + request path + query pairs.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, HttpError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path().trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", request.path())))?;

        if !request.query_pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in request.query_pairs() {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for TracedClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        let url = self.url_for(request)?;

        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %request.method(),
            http.url = %url,
            http.status_code = field::Empty,
            trace_id = field::Empty,
            retried = request.is_retried(),
            otel.kind = "client",
            error = field::Empty,
        );

        async {
            let mut builder = self.inner.request(request.method().clone(), url);
            if let Some(body) = request.body() {
                builder = builder.json(body);
            }
            let mut req = builder.build()?;

            if let Some(trace_id) = simple_otel::inject_trace_context(req.headers_mut()) {
                tracing::Span::current().record("trace_id", trace_id.as_str());
            }

            let response = match self.inner.execute(req).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::Span::current().record("error", true);
                    tracing::debug!(error = %e, "request failed without a response");
                    return Err(HttpError::from(e));
                }
            };

            let status = response.status();
            let span = tracing::Span::current();
            span.record("http.status_code", status.as_u16());
            if status.is_client_error() || status.is_server_error() {
                span.record("error", true);
            }

            let body = response.bytes().await?;
            Ok::<_, HttpError>(ApiResponse::new(status, body.to_vec()))
        }
        .instrument(span)
        .await
    }
}
