//! HTTP transport used for discovery and token requests.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::Url;

use crate::{FormBody, HttpAuth, TokenError};

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
    /// Time between sending the request and receiving the full response.
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status,
            body: body.into(),
            elapsed,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP primitives the token client relies on.
///
/// Implementations own connection pooling, TLS, timeouts and cancellation;
/// the client only propagates their errors. Transport failures are reported as
/// [`TokenError::Transport`]; non-2xx statuses are *not* errors at this level.
pub trait Transport: Send + Sync {
    /// Sends a `GET` request.
    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse, TokenError>> + Send;

    /// Sends a `POST` request with an `application/x-www-form-urlencoded` body.
    fn post_form(
        &self,
        url: &Url,
        body: &FormBody,
        auth: Option<&HttpAuth>,
    ) -> impl Future<Output = Result<HttpResponse, TokenError>> + Send;
}

/// [`Transport`] backed by a [`reqwest::Client`].
///
/// Configure timeouts, proxies and TLS on the `reqwest::Client` itself.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<HttpResponse, TokenError> {
        let start = Instant::now();
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        let elapsed = start.elapsed();

        debug!(status, ?elapsed, "...receiving");
        Ok(HttpResponse {
            status,
            body,
            elapsed,
        })
    }
}

fn transport_error(err: reqwest::Error) -> TokenError {
    TokenError::Transport {
        reason: err.to_string(),
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TokenError> {
        debug!(%url, "GET sending...");
        self.send(self.client.get(url.clone())).await
    }

    async fn post_form(
        &self,
        url: &Url,
        body: &FormBody,
        auth: Option<&HttpAuth>,
    ) -> Result<HttpResponse, TokenError> {
        let mut request = self
            .client
            .post(url.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body.encode()?);
        if let Some(auth) = auth {
            let (name, value) = auth.to_header()?;
            request = request.header(name, value);
        }

        debug!(%url, ?body, "POST sending...");
        self.send(request).await
    }
}
