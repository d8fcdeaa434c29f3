//! # OAuth Authority
//!
//! Acquire OAuth2/OIDC access tokens from an authorization server.
//!
//! Given [`Credentials`] for a grant type, the [`TokenClient`]:
//!
//! 1. discovers the server metadata (`/.well-known/openid-configuration`), once per client,
//! 2. negotiates a client authentication method from the credentials' preference
//!    list and the methods the server advertises,
//! 3. builds the token request (HTTP Basic, form-posted secret or signed JWT assertion),
//! 4. returns an expiry-aware [`Token`] or a typed [`TokenError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oauth_authority::{Credentials, TokenClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TokenClient::builder("https://auth.example.com/realms/demo")?.build()?;
//!
//! let credentials = Credentials::client_credentials("my-app", "my-secret")
//!     .with_scopes(["read:users", "write:users"]);
//!
//! let token = client.request_token(&credentials).await?;
//! assert!(!token.has_expired(jiff::Timestamp::now()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Client Authentication
//!
//! | Method                | HTTP auth                  | Body fields                                  |
//! |-----------------------|----------------------------|----------------------------------------------|
//! | `client_secret_basic` | Basic `client_id:secret`   | -                                            |
//! | `client_secret_post`  | -                          | `client_id`, `client_secret`                 |
//! | `client_secret_jwt`   | -                          | `client_assertion_type`, `client_assertion`  |
//!
//! Credentials without an explicit preference use
//! [`AuthMethod::DEFAULT_PREFERENCE`] (`client_secret_basic`, then
//! `client_secret_post`). JWT assertions are only used when asked for:
//!
//! ```rust
//! use oauth_authority::{AuthMethod, Credentials};
//!
//! let credentials = Credentials::client_credentials("my-app", "my-secret")
//!     .with_auth_methods([AuthMethod::ClientSecretJwt, AuthMethod::ClientSecretBasic]);
//! ```
//!
//! ## Errors
//!
//! Nothing is retried internally. [`TokenError::is_retryable`] tells transport
//! failures apart from configuration and protocol errors.

mod auth;
mod client;
mod clock;
mod credentials;
mod error;
mod form;
mod grant;
mod metadata;
mod token;
mod transport;

pub mod builders;
pub mod negotiate;

#[cfg(test)]
mod testing;

pub use self::auth::{HttpAuth, SecureString};
pub use self::builders::{
    BuildContext, DEFAULT_ASSERTION_TTL, JWT_BEARER_ASSERTION_TYPE, RequestBuilder,
};
pub use self::client::{TokenClient, TokenClientBuilder};
pub use self::clock::{Clock, FixedClock, FixedIdGenerator, IdGenerator, RandomIdGenerator, SystemClock};
pub use self::credentials::{ACCESS_TOKEN_TYPE, ClientIdentity, Credentials, CredentialsKey};
pub use self::error::TokenError;
pub use self::form::FormBody;
pub use self::grant::{AuthMethod, GrantType, UnknownIdentifier};
pub use self::metadata::{AuthorityMetadata, DISCOVERY_PATH, DiscoveryCache};
pub use self::negotiate::BuilderRegistry;
pub use self::token::Token;
pub use self::transport::{HttpResponse, ReqwestTransport, Transport};
