//! In-memory transport for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use url::Url;

use crate::{FormBody, HttpAuth, HttpResponse, TokenError, Transport};

/// A token request as seen by the transport.
#[derive(Debug, Clone)]
pub(crate) struct RecordedPost {
    pub(crate) url: Url,
    pub(crate) body: FormBody,
    pub(crate) auth: Option<HttpAuth>,
}

/// Replays canned responses and records what was sent.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    get_response: Option<HttpResponse>,
    get_delay: Duration,
    post_response: Option<HttpResponse>,
    gets: AtomicUsize,
    posts: Mutex<Vec<RecordedPost>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_get(mut self, status: u16, body: impl Into<String>) -> Self {
        self.get_response = Some(HttpResponse::new(status, body, Duration::ZERO));
        self
    }

    pub(crate) fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = delay;
        self
    }

    pub(crate) fn with_post(
        mut self,
        status: u16,
        body: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        self.post_response = Some(HttpResponse::new(status, body, elapsed));
        self
    }

    pub(crate) fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn posts(&self) -> Vec<RecordedPost> {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn last_post(&self) -> RecordedPost {
        self.posts().pop().expect("a token request was sent")
    }
}

fn unconfigured(method: &str) -> TokenError {
    TokenError::Transport {
        reason: format!("no {method} response configured"),
    }
}

impl Transport for MockTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TokenError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if !self.get_delay.is_zero() {
            tokio::time::sleep(self.get_delay).await;
        }
        self.get_response.clone().ok_or_else(|| unconfigured("GET"))
    }

    async fn post_form(
        &self,
        url: &Url,
        body: &FormBody,
        auth: Option<&HttpAuth>,
    ) -> Result<HttpResponse, TokenError> {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedPost {
                url: url.clone(),
                body: body.clone(),
                auth: auth.cloned(),
            });
        self.post_response.clone().ok_or_else(|| unconfigured("POST"))
    }
}

/// A discovery document advertising the given client authentication methods.
pub(crate) fn discovery_json(auth_methods: &[&str]) -> String {
    serde_json::json!({
        "issuer": "https://auth.example.com/realms/demo",
        "token_endpoint": "https://auth.example.com/realms/demo/protocol/openid-connect/token",
        "token_endpoint_auth_methods_supported": auth_methods,
        "grant_types_supported": [
            "client_credentials",
            "password",
            "refresh_token",
            "urn:ietf:params:oauth:grant-type:token-exchange"
        ]
    })
    .to_string()
}
