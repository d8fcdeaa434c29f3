//! Issued token and token endpoint response parsing.

use std::fmt;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Deserializer};

use crate::SecureString;

/// An access token with expiration tracking.
///
/// Tokens are immutable: a new value is built for each successful token
/// response and replaced by the caller once superseded or expired.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    token_type: String,
    access_token: SecureString,
    emitted_at: Timestamp,
    expires_in: Duration,
    scopes: Vec<String>,
    refresh_token: Option<SecureString>,
}

impl Token {
    /// Creates a new token.
    pub fn new(
        token_type: impl Into<String>,
        access_token: impl Into<SecureString>,
        emitted_at: Timestamp,
        expires_in: Duration,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: access_token.into(),
            emitted_at,
            expires_in,
            scopes,
            refresh_token: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<SecureString>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Returns the token type, usually `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns the access token value.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Returns the instant the token lifetime starts from.
    pub fn emitted_at(&self) -> Timestamp {
        self.emitted_at
    }

    /// Returns the token lifetime.
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Returns the granted scopes, in server order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Returns the refresh token if the server issued one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(SecureString::as_str)
    }

    /// Returns the instant the token stops being valid.
    pub fn expires_at(&self) -> Timestamp {
        self.emitted_at
            .checked_add(self.expires_in)
            .unwrap_or(Timestamp::MAX)
    }

    /// Returns `true` if the token has expired at `now`.
    ///
    /// The boundary is inclusive: a token is expired at exactly `emitted_at + expires_in`.
    pub fn has_expired(&self, now: Timestamp) -> bool {
        self.expires_at() <= now
    }

    /// Returns the value for an `Authorization` header.
    pub fn to_bearer_string(&self) -> String {
        format!("Bearer {}", self.access_token.as_str())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("emitted_at", &self.emitted_at)
            .field("expires_in", &self.expires_in)
            .field("scopes", &self.scopes)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Successful token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    token_type: String,
    access_token: SecureString,
    #[serde(deserialize_with = "deserialize_seconds")]
    expires_in: u64,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    refresh_token: Option<SecureString>,
}

impl TokenResponse {
    /// Converts the response into a [`Token`].
    ///
    /// An absent `scope` means the server granted exactly what was requested.
    pub(crate) fn into_token(self, emitted_at: Timestamp, requested_scopes: &[String]) -> Token {
        let scopes = match &self.scope {
            Some(scope) => scope.split_whitespace().map(String::from).collect(),
            None => requested_scopes.to_vec(),
        };

        Token {
            token_type: self.token_type,
            access_token: self.access_token,
            emitted_at,
            expires_in: Duration::from_secs(self.expires_in),
            scopes,
            refresh_token: self.refresh_token,
        }
    }
}

/// OAuth2 error response (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(default)]
    pub(crate) error_description: Option<String>,
}

/// Deserialize a number of seconds that may be either a number or a numeric string.
/// Some servers (Keycloak behind some proxies, Azure AD v1) send `"3600"`.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(secs) => Ok(secs),
        NumberOrString::String(secs) => secs.trim().parse().map_err(serde::de::Error::custom),
    }
}
