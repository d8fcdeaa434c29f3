//! Protocol identifiers: grant types and client authentication methods.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OAuth2 grant type, as sent in the `grant_type` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantType {
    /// `authorization_code`
    #[serde(rename = "authorization_code")]
    AuthorizationCode,
    /// `implicit`
    #[serde(rename = "implicit")]
    Implicit,
    /// `refresh_token`
    #[serde(rename = "refresh_token")]
    RefreshToken,
    /// `password` (resource owner password credentials)
    #[serde(rename = "password")]
    Password,
    /// `client_credentials`
    #[serde(rename = "client_credentials")]
    ClientCredentials,
    /// `urn:openid:params:grant-type:ciba`
    #[serde(rename = "urn:openid:params:grant-type:ciba")]
    Ciba,
    /// `urn:ietf:params:oauth:grant-type:token-exchange`
    #[serde(rename = "urn:ietf:params:oauth:grant-type:token-exchange")]
    TokenExchange,
    /// `urn:ietf:params:oauth:grant-type:device_code`
    #[serde(rename = "urn:ietf:params:oauth:grant-type:device_code")]
    DeviceCode,
}

impl GrantType {
    const ALL: [Self; 8] = [
        Self::AuthorizationCode,
        Self::Implicit,
        Self::RefreshToken,
        Self::Password,
        Self::ClientCredentials,
        Self::Ciba,
        Self::TokenExchange,
        Self::DeviceCode,
    ];

    /// Returns the wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::RefreshToken => "refresh_token",
            Self::Password => "password",
            Self::ClientCredentials => "client_credentials",
            Self::Ciba => "urn:openid:params:grant-type:ciba",
            Self::TokenExchange => "urn:ietf:params:oauth:grant-type:token-exchange",
            Self::DeviceCode => "urn:ietf:params:oauth:grant-type:device_code",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = UnknownIdentifier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|grant| grant.as_str() == value)
            .ok_or_else(|| UnknownIdentifier(value.to_string()))
    }
}

/// Client authentication method at the token endpoint.
///
/// Only the `client_secret_*` methods have a request builder out of the box;
/// the others are extension points (see
/// [`TokenClientBuilder::with_request_builder`](crate::TokenClientBuilder::with_request_builder)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// HTTP Basic authentication with `client_id:client_secret`.
    ClientSecretBasic,
    /// `client_id` and `client_secret` in the form body.
    ClientSecretPost,
    /// JWT assertion signed with the client secret (HS256).
    ClientSecretJwt,
    /// JWT assertion signed with a private key.
    PrivateKeyJwt,
    /// Mutual TLS client authentication.
    TlsClientAuth,
}

impl AuthMethod {
    const ALL: [Self; 5] = [
        Self::ClientSecretBasic,
        Self::ClientSecretPost,
        Self::ClientSecretJwt,
        Self::PrivateKeyJwt,
        Self::TlsClientAuth,
    ];

    /// Preference order used when credentials do not state one.
    ///
    /// JWT assertions are never picked implicitly.
    pub const DEFAULT_PREFERENCE: [Self; 2] = [Self::ClientSecretBasic, Self::ClientSecretPost];

    /// Returns the wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::TlsClientAuth => "tls_client_auth",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = UnknownIdentifier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == value)
            .ok_or_else(|| UnknownIdentifier(value.to_string()))
    }
}

/// A grant type or auth method string this crate does not know.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[display("unknown identifier '{_0}'")]
pub struct UnknownIdentifier(#[error(not(source))] pub String);
