//! Authorization server metadata discovery.
//!
//! Implements the subset of OpenID Connect Discovery 1.0 (and RFC 8414) a
//! token client needs.

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::{AuthMethod, GrantType, TokenError, Transport};

/// Path of the discovery document, relative to the issuer.
pub const DISCOVERY_PATH: &str = ".well-known/openid-configuration";

/// Authorization server metadata relevant to token acquisition.
///
/// Parsing requires `token_endpoint`, `token_endpoint_auth_methods_supported`
/// and `grant_types_supported`. Values this crate does not know are left out
/// of the typed lists; unknown auth methods are kept as advertised in
/// [`unrecognized_auth_methods`](Self::unrecognized_auth_methods).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DiscoveryDocument")]
pub struct AuthorityMetadata {
    /// Authorization server issuer identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Token endpoint URL.
    pub token_endpoint: Url,

    /// Supported token endpoint client authentication methods.
    pub token_endpoint_auth_methods_supported: Vec<AuthMethod>,

    /// Supported grant types.
    pub grant_types_supported: Vec<GrantType>,

    /// Advertised client authentication methods with no [`AuthMethod`] counterpart.
    #[serde(skip_serializing)]
    pub unrecognized_auth_methods: Vec<String>,
}

/// The discovery document fields, as sent by the server.
#[derive(Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    issuer: Option<String>,
    token_endpoint: Url,
    token_endpoint_auth_methods_supported: Vec<String>,
    grant_types_supported: Vec<String>,
}

impl From<DiscoveryDocument> for AuthorityMetadata {
    fn from(document: DiscoveryDocument) -> Self {
        let (auth_methods, unrecognized_auth_methods) =
            partition_known(document.token_endpoint_auth_methods_supported);
        let (grant_types, unknown_grant_types) = partition_known(document.grant_types_supported);

        if !unrecognized_auth_methods.is_empty() || !unknown_grant_types.is_empty() {
            debug!(
                auth_methods = ?unrecognized_auth_methods,
                grant_types = ?unknown_grant_types,
                "ignoring unsupported discovery values"
            );
        }

        Self {
            issuer: document.issuer,
            token_endpoint: document.token_endpoint,
            token_endpoint_auth_methods_supported: auth_methods,
            grant_types_supported: grant_types,
            unrecognized_auth_methods,
        }
    }
}

/// Splits identifiers into the ones this crate knows and the raw rest.
fn partition_known<T>(values: Vec<String>) -> (Vec<T>, Vec<String>)
where
    T: std::str::FromStr,
{
    let mut known = Vec::with_capacity(values.len());
    let mut unknown = Vec::new();
    for value in values {
        match value.parse() {
            Ok(parsed) => known.push(parsed),
            Err(_) => unknown.push(value),
        }
    }
    (known, unknown)
}

impl AuthorityMetadata {
    /// Creates metadata for a token endpoint.
    ///
    /// Until replaced, the lists hold the RFC 8414 defaults:
    /// `client_secret_basic`, and the `authorization_code` and `implicit` grants.
    pub fn new(token_endpoint: Url) -> Self {
        Self {
            issuer: None,
            token_endpoint,
            token_endpoint_auth_methods_supported: vec![AuthMethod::ClientSecretBasic],
            grant_types_supported: vec![GrantType::AuthorizationCode, GrantType::Implicit],
            unrecognized_auth_methods: Vec::new(),
        }
    }

    /// Replaces the supported client authentication methods.
    #[must_use]
    pub fn with_auth_methods(mut self, methods: impl IntoIterator<Item = AuthMethod>) -> Self {
        self.token_endpoint_auth_methods_supported = methods.into_iter().collect();
        self
    }

    /// Replaces the supported grant types.
    #[must_use]
    pub fn with_grant_types(mut self, grants: impl IntoIterator<Item = GrantType>) -> Self {
        self.grant_types_supported = grants.into_iter().collect();
        self
    }

    /// Returns `true` if the server advertises `grant`.
    pub fn supports_grant(&self, grant: GrantType) -> bool {
        self.grant_types_supported.contains(&grant)
    }

    /// Returns `true` if the server advertises `method`.
    pub fn supports_auth_method(&self, method: AuthMethod) -> bool {
        self.token_endpoint_auth_methods_supported.contains(&method)
    }
}

/// Builds the discovery URL for an issuer.
///
/// Issuers may carry a path (e.g. Keycloak realms), so the well-known suffix
/// is appended rather than resolved against the host.
pub(crate) fn discovery_url(issuer: &Url) -> Result<Url, TokenError> {
    let url = format!("{}/{DISCOVERY_PATH}", issuer.as_str().trim_end_matches('/'));
    Url::parse(&url).map_err(|err| TokenError::ConfigurationInvalid {
        url: issuer.to_string(),
        reason: format!("cannot build discovery URL: {err}"),
    })
}

/// Lazily fetched, memoized authorization server metadata.
///
/// The slot is either unset or cached, and never goes back to unset.
/// Concurrent first callers share a single discovery request. A failed
/// discovery leaves the slot unset.
#[derive(Debug)]
pub struct DiscoveryCache {
    url: Url,
    metadata: OnceCell<AuthorityMetadata>,
}

impl DiscoveryCache {
    /// Creates an empty cache for the given discovery URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            metadata: OnceCell::new(),
        }
    }

    /// Creates a cache already holding `metadata`; no discovery request is ever made.
    pub fn with_metadata(url: Url, metadata: AuthorityMetadata) -> Self {
        Self {
            url,
            metadata: OnceCell::new_with(Some(metadata)),
        }
    }

    /// Returns the discovery URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the cached metadata without fetching it.
    pub fn cached(&self) -> Option<&AuthorityMetadata> {
        self.metadata.get()
    }

    /// Returns the metadata, fetching it on first use.
    ///
    /// # Errors
    ///
    /// - [`TokenError::ConfigurationNotFound`] on HTTP 404
    /// - [`TokenError::Transport`] on any other non-2xx status or network failure
    /// - [`TokenError::ConfigurationInvalid`] if the document cannot be parsed
    pub async fn metadata<T>(&self, transport: &T) -> Result<&AuthorityMetadata, TokenError>
    where
        T: Transport,
    {
        self.metadata
            .get_or_try_init(|| self.fetch(transport))
            .await
    }

    async fn fetch<T>(&self, transport: &T) -> Result<AuthorityMetadata, TokenError>
    where
        T: Transport,
    {
        debug!(url = %self.url, "Discovering OpenID configuration");
        let response = transport.get(&self.url).await?;

        if response.status == 404 {
            return Err(TokenError::ConfigurationNotFound {
                url: self.url.to_string(),
            });
        }
        if !response.is_success() {
            return Err(TokenError::Transport {
                reason: format!(
                    "OpenID configuration discovery failed: HTTP {}",
                    response.status
                ),
            });
        }

        let metadata: AuthorityMetadata =
            serde_json::from_str(&response.body).map_err(|err| {
                TokenError::ConfigurationInvalid {
                    url: self.url.to_string(),
                    reason: err.to_string(),
                }
            })?;

        debug!(
            token_endpoint = %metadata.token_endpoint,
            auth_methods = ?metadata.token_endpoint_auth_methods_supported,
            "Discovered authorization server"
        );
        Ok(metadata)
    }
}
