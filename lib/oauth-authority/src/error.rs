//! Token acquisition error types.

use crate::AuthMethod;

/// Errors that can occur while acquiring a token.
///
/// Every failure is surfaced to the caller; nothing is retried internally.
/// Callers branch on the variant to decide whether to retry, refresh the
/// credentials or abort.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum TokenError {
    /// The discovery document does not exist (HTTP 404).
    #[display("OpenID configuration not found at {url}")]
    ConfigurationNotFound {
        /// The discovery URL that was requested.
        url: String,
    },

    /// The discovery document exists but cannot be used.
    #[display("Invalid OpenID configuration at {url}: {reason}")]
    ConfigurationInvalid {
        /// The discovery URL, or the issuer when the URL itself is invalid.
        url: String,
        /// Description of what was invalid.
        reason: String,
    },

    /// None of the requested client authentication methods is supported by the server.
    #[display(
        "None of the requested auth methods is supported: {}. Supported methods are {}",
        join_methods(requested),
        join_methods(supported)
    )]
    NoSupportedAuthMethod {
        /// Methods tried, in preference order.
        requested: Vec<AuthMethod>,
        /// Methods advertised by the server.
        supported: Vec<AuthMethod>,
    },

    /// The token endpoint answered with an OAuth2 error object.
    #[display(
        "[{status_code}] {error}{}",
        error_description.as_deref().map(|desc| format!(" - {desc}")).unwrap_or_default()
    )]
    TokenRequestRejected {
        /// OAuth2 error code, e.g. `invalid_client`.
        error: String,
        /// Human readable description, if the server sent one.
        error_description: Option<String>,
        /// HTTP status code of the response.
        status_code: u16,
    },

    /// Network failure, unexpected status or unparseable response body.
    #[display("Transport error: {reason}")]
    Transport {
        /// Description of the failure.
        reason: String,
    },

    /// The signed JWT client assertion could not be produced.
    #[display("Cannot build client assertion: {reason}")]
    ClientAssertion {
        /// Description of the failure.
        reason: String,
    },
}

impl TokenError {
    /// Returns `true` if the same request may succeed when sent again.
    ///
    /// Only transport failures qualify; configuration, negotiation and
    /// protocol rejections need a change on the caller side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

fn join_methods(methods: &[AuthMethod]) -> String {
    methods
        .iter()
        .map(|method| method.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
