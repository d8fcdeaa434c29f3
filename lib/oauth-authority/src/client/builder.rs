use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::TokenClient;
use crate::builders::{DEFAULT_ASSERTION_TTL, RequestBuilder};
use crate::metadata::{DiscoveryCache, discovery_url};
use crate::negotiate::BuilderRegistry;
use crate::{
    AuthMethod, AuthorityMetadata, Clock, IdGenerator, RandomIdGenerator, ReqwestTransport,
    SystemClock, TokenError, Transport,
};

/// Builder for [`TokenClient`].
///
/// # Default Configuration
///
/// - **Transport**: [`ReqwestTransport`] with a default `reqwest::Client`
/// - **Metadata**: discovered from `{issuer}/.well-known/openid-configuration`
/// - **Clock**: [`SystemClock`]
/// - **Assertion ids**: [`RandomIdGenerator`] (UUID v4)
/// - **Assertion lifetime**: 1000 seconds
/// - **Builders**: `client_secret_basic`, `client_secret_post`, `client_secret_jwt`
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use oauth_authority::{AuthorityMetadata, TokenClient};
/// use url::Url;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let metadata = AuthorityMetadata::new(Url::parse("https://auth.example.com/token")?);
///
/// let client = TokenClient::builder("https://auth.example.com")?
///     .with_metadata(metadata)           // no discovery request
///     .with_assertion_ttl(Duration::from_secs(300))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenClientBuilder<T = ReqwestTransport> {
    issuer: Url,
    transport: T,
    metadata: Option<AuthorityMetadata>,
    registry: BuilderRegistry,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    assertion_ttl: Duration,
}

impl TokenClientBuilder<ReqwestTransport> {
    pub(super) fn new(issuer: impl AsRef<str>) -> Result<Self, TokenError> {
        let issuer =
            Url::parse(issuer.as_ref()).map_err(|err| TokenError::ConfigurationInvalid {
                url: issuer.as_ref().to_string(),
                reason: format!("invalid issuer URL: {err}"),
            })?;

        Ok(Self {
            issuer,
            transport: ReqwestTransport::default(),
            metadata: None,
            registry: BuilderRegistry::default(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIdGenerator),
            assertion_ttl: DEFAULT_ASSERTION_TTL,
        })
    }

    /// Uses the given `reqwest::Client` for all requests.
    #[must_use]
    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.transport = ReqwestTransport::new(client);
        self
    }
}

impl<T> TokenClientBuilder<T> {
    /// Replaces the transport.
    pub fn with_transport<U>(self, transport: U) -> TokenClientBuilder<U>
    where
        U: Transport,
    {
        let Self {
            issuer,
            transport: _,
            metadata,
            registry,
            clock,
            ids,
            assertion_ttl,
        } = self;

        TokenClientBuilder {
            issuer,
            transport,
            metadata,
            registry,
            clock,
            ids,
            assertion_ttl,
        }
    }

    /// Uses known metadata instead of discovering it.
    #[must_use]
    pub fn with_metadata(mut self, metadata: AuthorityMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the time source used for token emission time and assertion expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the source of client assertion identifiers (`jti`).
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Sets the lifetime of client assertions.
    #[must_use]
    pub fn with_assertion_ttl(mut self, ttl: Duration) -> Self {
        self.assertion_ttl = ttl;
        self
    }

    /// Registers a request builder for `method`, replacing any existing one.
    #[must_use]
    pub fn with_request_builder(mut self, method: AuthMethod, builder: RequestBuilder) -> Self {
        self.registry = self.registry.with_builder(method, builder);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigurationInvalid`] if no discovery URL can be
    /// derived from the issuer.
    pub fn build(self) -> Result<TokenClient<T>, TokenError> {
        let Self {
            issuer,
            transport,
            metadata,
            registry,
            clock,
            ids,
            assertion_ttl,
        } = self;

        let url = discovery_url(&issuer)?;
        let discovery = match metadata {
            Some(metadata) => DiscoveryCache::with_metadata(url, metadata),
            None => DiscoveryCache::new(url),
        };

        Ok(TokenClient {
            transport,
            discovery,
            registry,
            clock,
            ids,
            assertion_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_invalid_issuer() {
        let err = TokenClient::builder("not-a-url").expect_err("invalid issuer");
        assert!(matches!(
            err,
            TokenError::ConfigurationInvalid { ref url, .. } if url == "not-a-url"
        ));
    }

    #[test]
    fn should_derive_discovery_url_from_issuer() {
        let client = TokenClient::builder("https://auth.example.com/realms/demo")
            .expect("valid issuer")
            .build()
            .expect("valid client");

        assert_eq!(
            client.discovery.url().as_str(),
            "https://auth.example.com/realms/demo/.well-known/openid-configuration"
        );
        assert!(client.discovery.cached().is_none());
        assert_eq!(client.assertion_ttl, DEFAULT_ASSERTION_TTL);
    }

    #[test]
    fn should_cache_injected_metadata() {
        let metadata =
            AuthorityMetadata::new(Url::parse("https://auth.example.com/token").expect("url"));
        let client = TokenClient::builder("https://auth.example.com")
            .expect("valid issuer")
            .with_metadata(metadata.clone())
            .build()
            .expect("valid client");

        assert_eq!(client.discovery.cached(), Some(&metadata));
    }
}
