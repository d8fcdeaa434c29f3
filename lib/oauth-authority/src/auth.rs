//! Secrets and HTTP authentication for token requests.

use std::fmt;

use base64::Engine;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::TokenError;

/// A client secret, password or token.
///
/// Zeroed on drop. `Debug` prints `[REDACTED]`, `Display` only the first and
/// last four characters. Serializes as the plain string.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps `value`.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the secret value, e.g. to put it on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `***` up to 8 characters, `head...tail` beyond.
    fn mask(value: &str) -> String {
        if value.len() <= 8 {
            "***".to_string()
        } else {
            let head = value.get(..4).unwrap_or_default();
            let tail = value.get(value.len() - 4..).unwrap_or_default();
            format!("{head}...{tail}")
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecureString").field(&"[REDACTED]").finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// HTTP-level authentication attached to a token request.
///
/// Request builders return `None` when the client authenticates through the
/// form body instead; the transport then sends no `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum HttpAuth {
    /// HTTP Basic authentication (RFC 7617).
    /// Adds `Authorization: Basic <base64(username:password)>` header.
    Basic {
        /// The username, the `client_id` for token requests.
        username: String,
        /// The password, the `client_secret` (possibly empty).
        password: SecureString,
    },
}

impl HttpAuth {
    /// Creates Basic authentication from a username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Converts the authentication into an HTTP header.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Transport`] if the encoded value is not a valid header value.
    pub fn to_header(&self) -> Result<(HeaderName, HeaderValue), TokenError> {
        match self {
            Self::Basic { username, password } => {
                let credentials_str = format!("{username}:{}", password.as_str());
                let credentials = base64::engine::general_purpose::STANDARD.encode(credentials_str);

                let mut value =
                    HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|err| {
                        TokenError::Transport {
                            reason: format!("invalid basic authorization header: {err}"),
                        }
                    })?;
                value.set_sensitive(true);
                Ok((AUTHORIZATION, value))
            }
        }
    }
}

impl fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}
