//! Token client: discovery, negotiation and the token request.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::builders::BuildContext;
use crate::metadata::DiscoveryCache;
use crate::negotiate::BuilderRegistry;
use crate::token::{ErrorResponse, TokenResponse};
use crate::{
    AuthMethod, AuthorityMetadata, Clock, Credentials, FormBody, GrantType, HttpResponse,
    IdGenerator, ReqwestTransport, Token, TokenError, Transport,
};

mod builder;
pub use self::builder::TokenClientBuilder;

/// OAuth2 token client for one authorization server.
///
/// The client discovers the server metadata on first use (once, shared by
/// concurrent callers), negotiates a client authentication method with each
/// [`Credentials`] and returns a typed [`Token`]. It holds no other state
/// and performs no retries.
///
/// # Example
///
/// ```rust,no_run
/// use oauth_authority::{Credentials, TokenClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TokenClient::builder("https://auth.example.com/realms/demo")?.build()?;
///
/// let credentials = Credentials::client_credentials("my-app", "my-secret")
///     .with_scopes(["read:users"]);
/// let token = client.request_token(&credentials).await?;
///
/// println!("{}", token.to_bearer_string());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenClient<T = ReqwestTransport> {
    transport: T,
    discovery: DiscoveryCache,
    registry: BuilderRegistry,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    assertion_ttl: Duration,
}

impl TokenClient<ReqwestTransport> {
    /// Creates a builder for the authorization server identified by `issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigurationInvalid`] if `issuer` is not a valid URL.
    pub fn builder(
        issuer: impl AsRef<str>,
    ) -> Result<TokenClientBuilder<ReqwestTransport>, TokenError> {
        TokenClientBuilder::new(issuer)
    }
}

impl<T> TokenClient<T>
where
    T: Transport,
{
    /// Returns the authorization server metadata, discovering it on first call.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryCache::metadata`].
    pub async fn metadata(&self) -> Result<&AuthorityMetadata, TokenError> {
        self.discovery.metadata(&self.transport).await
    }

    /// Returns `true` if the server advertises `grant`.
    ///
    /// # Errors
    ///
    /// Fails if the metadata cannot be discovered.
    pub async fn supports_grant(&self, grant: GrantType) -> Result<bool, TokenError> {
        Ok(self.metadata().await?.supports_grant(grant))
    }

    /// Returns `true` if the server advertises `method` for the token endpoint.
    ///
    /// # Errors
    ///
    /// Fails if the metadata cannot be discovered.
    pub async fn supports_auth_method(&self, method: AuthMethod) -> Result<bool, TokenError> {
        Ok(self.metadata().await?.supports_auth_method(method))
    }

    /// Requests a new token.
    ///
    /// The request body is `grant_type`, the grant fields of `credentials`,
    /// whatever the negotiated client authentication method adds, then `scope`
    /// when scopes are requested.
    ///
    /// # Errors
    ///
    /// - discovery errors, see [`DiscoveryCache::metadata`]
    /// - [`TokenError::NoSupportedAuthMethod`] if negotiation fails, before any request is sent
    /// - [`TokenError::ClientAssertion`] if the JWT assertion cannot be built
    /// - [`TokenError::TokenRequestRejected`] if the server answers with an OAuth2 error
    /// - [`TokenError::Transport`] on network failure or unparseable response
    pub async fn request_token(&self, credentials: &Credentials) -> Result<Token, TokenError> {
        let metadata = self.metadata().await?;

        let (method, build) = self
            .registry
            .select(
                credentials.auth_methods(),
                &metadata.token_endpoint_auth_methods_supported,
            )
            .inspect_err(|err| {
                warn!(
                    client_id = credentials.client_id(),
                    unrecognized = ?metadata.unrecognized_auth_methods,
                    "{err}"
                );
            })?;
        debug!(
            client_id = credentials.client_id(),
            grant_type = %credentials.grant_type(),
            auth_method = %method,
            "Negotiated client authentication"
        );

        let mut body = FormBody::new().with("grant_type", credentials.grant_type().as_str());
        body.extend(credentials.to_request_body());

        let context = BuildContext {
            token_endpoint: &metadata.token_endpoint,
            clock: self.clock.as_ref(),
            ids: self.ids.as_ref(),
            assertion_ttl: self.assertion_ttl,
        };
        let (auth, mut body) = build(credentials, &context, body)?;

        if !credentials.scopes().is_empty() {
            body.set("scope", credentials.scopes().join(" "));
        }

        let response = self
            .transport
            .post_form(&metadata.token_endpoint, &body, auth.as_ref())
            .await?;

        if !response.is_success() {
            return Err(rejection(&response));
        }

        let token_response: TokenResponse =
            serde_json::from_str(&response.body).map_err(|err| TokenError::Transport {
                reason: format!("invalid token response: {err}"),
            })?;

        let now = self.clock.now();
        let emitted_at = now.checked_sub(response.elapsed).unwrap_or(now);
        let token = token_response.into_token(emitted_at, credentials.scopes());

        debug!(
            client_id = credentials.client_id(),
            token_type = token.token_type(),
            expires_in = ?token.expires_in(),
            "Token issued"
        );
        Ok(token)
    }
}

fn rejection(response: &HttpResponse) -> TokenError {
    match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(ErrorResponse {
            error,
            error_description,
        }) => {
            warn!(
                status = response.status,
                %error,
                ?error_description,
                "Token request rejected"
            );
            TokenError::TokenRequestRejected {
                error,
                error_description,
                status_code: response.status,
            }
        }
        Err(err) => TokenError::Transport {
            reason: format!(
                "token request failed with HTTP {} and an unreadable body: {err}",
                response.status
            ),
        },
    }
}
