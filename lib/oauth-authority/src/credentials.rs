//! Credentials, one variant per supported grant type.
//!
//! A [`Credentials`] value knows its grant type, the client it belongs to and
//! the grant-specific form fields. It never renders `scope`: the token client
//! appends it after client authentication has been applied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AuthMethod, FormBody, GrantType, SecureString};

/// Default `subject_token_type` for token exchange.
pub const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

/// The OAuth2 client a request is made for.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Client identifier.
    pub client_id: String,
    /// Client secret, absent for public clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<SecureString>,
    /// Requested scopes, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Acceptable client authentication methods, most preferred first.
    /// Empty means [`AuthMethod::DEFAULT_PREFERENCE`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_methods: Vec<AuthMethod>,
}

impl ClientIdentity {
    /// Creates a public client identity.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            scopes: Vec::new(),
            auth_methods: Vec::new(),
        }
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scopes", &self.scopes)
            .field("auth_methods", &self.auth_methods)
            .finish()
    }
}

/// Credentials for a token request.
///
/// Values are immutable: `with_*` methods return a new value.
///
/// # Example
///
/// ```rust
/// use oauth_authority::{AuthMethod, Credentials};
///
/// let credentials = Credentials::client_credentials("my-app", "my-secret")
///     .with_auth_methods([AuthMethod::ClientSecretPost])
///     .with_scopes(["read", "write"]);
///
/// assert_eq!(credentials.scopes(), ["read", "write"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant_type")]
pub enum Credentials {
    /// Client credentials grant (machine-to-machine).
    #[serde(rename = "client_credentials")]
    ClientCredentials {
        /// The client.
        #[serde(flatten)]
        client: ClientIdentity,
    },

    /// Resource owner password credentials grant.
    #[serde(rename = "password")]
    ResourceOwnerPassword {
        /// The client.
        #[serde(flatten)]
        client: ClientIdentity,
        /// Resource owner username.
        username: String,
        /// Resource owner password.
        password: SecureString,
    },

    /// Refresh token grant.
    #[serde(rename = "refresh_token")]
    RefreshToken {
        /// The client.
        #[serde(flatten)]
        client: ClientIdentity,
        /// The refresh token to redeem.
        refresh_token: SecureString,
    },

    /// Token exchange grant (RFC 8693).
    #[serde(rename = "urn:ietf:params:oauth:grant-type:token-exchange")]
    TokenExchange {
        /// The client.
        #[serde(flatten)]
        client: ClientIdentity,
        /// The token to exchange.
        subject_token: SecureString,
        /// Type of `subject_token`.
        #[serde(default = "default_subject_token_type")]
        subject_token_type: String,
        /// Target service of the requested token.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audience: Option<String>,
    },
}

fn default_subject_token_type() -> String {
    ACCESS_TOKEN_TYPE.to_string()
}

impl Credentials {
    /// Creates client credentials.
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
    ) -> Self {
        let mut client = ClientIdentity::new(client_id);
        client.client_secret = Some(client_secret.into());
        Self::ClientCredentials { client }
    }

    /// Creates resource owner password credentials for a public client.
    pub fn password(
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecureString>,
    ) -> Self {
        Self::ResourceOwnerPassword {
            client: ClientIdentity::new(client_id),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates refresh token credentials for a public client.
    pub fn refresh_token(
        client_id: impl Into<String>,
        refresh_token: impl Into<SecureString>,
    ) -> Self {
        Self::RefreshToken {
            client: ClientIdentity::new(client_id),
            refresh_token: refresh_token.into(),
        }
    }

    /// Creates token exchange credentials for an access token, for a public client.
    pub fn token_exchange(
        client_id: impl Into<String>,
        subject_token: impl Into<SecureString>,
    ) -> Self {
        Self::TokenExchange {
            client: ClientIdentity::new(client_id),
            subject_token: subject_token.into(),
            subject_token_type: default_subject_token_type(),
            audience: None,
        }
    }

    /// Returns the grant type.
    pub fn grant_type(&self) -> GrantType {
        match self {
            Self::ClientCredentials { .. } => GrantType::ClientCredentials,
            Self::ResourceOwnerPassword { .. } => GrantType::Password,
            Self::RefreshToken { .. } => GrantType::RefreshToken,
            Self::TokenExchange { .. } => GrantType::TokenExchange,
        }
    }

    /// Returns the client.
    pub fn client(&self) -> &ClientIdentity {
        match self {
            Self::ClientCredentials { client }
            | Self::ResourceOwnerPassword { client, .. }
            | Self::RefreshToken { client, .. }
            | Self::TokenExchange { client, .. } => client,
        }
    }

    fn client_mut(&mut self) -> &mut ClientIdentity {
        match self {
            Self::ClientCredentials { client }
            | Self::ResourceOwnerPassword { client, .. }
            | Self::RefreshToken { client, .. }
            | Self::TokenExchange { client, .. } => client,
        }
    }

    /// Returns the client identifier.
    pub fn client_id(&self) -> &str {
        &self.client().client_id
    }

    /// Returns the client secret.
    pub fn client_secret(&self) -> Option<&SecureString> {
        self.client().client_secret.as_ref()
    }

    /// Returns the requested scopes.
    pub fn scopes(&self) -> &[String] {
        &self.client().scopes
    }

    /// Returns the client authentication methods in preference order, possibly empty.
    pub fn auth_methods(&self) -> &[AuthMethod] {
        &self.client().auth_methods
    }

    /// Returns a copy with the given client secret.
    #[must_use]
    pub fn with_client_secret(&self, client_secret: impl Into<SecureString>) -> Self {
        let mut result = self.clone();
        result.client_mut().client_secret = Some(client_secret.into());
        result
    }

    /// Returns a copy requesting the given scopes.
    #[must_use]
    pub fn with_scopes(&self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut result = self.clone();
        result.client_mut().scopes = scopes.into_iter().map(Into::into).collect();
        result
    }

    /// Returns a copy accepting the given client authentication methods, most preferred first.
    #[must_use]
    pub fn with_auth_methods(&self, auth_methods: impl IntoIterator<Item = AuthMethod>) -> Self {
        let mut result = self.clone();
        result.client_mut().auth_methods = auth_methods.into_iter().collect();
        result
    }

    /// Returns a copy with the token exchange audience set.
    ///
    /// Other grants have no audience and are returned unchanged.
    #[must_use]
    pub fn with_audience(&self, audience: impl Into<String>) -> Self {
        let mut result = self.clone();
        if let Self::TokenExchange {
            audience: slot, ..
        } = &mut result
        {
            *slot = Some(audience.into());
        }
        result
    }

    /// Returns refresh token credentials for the same client.
    #[must_use]
    pub fn refresh(&self, refresh_token: impl Into<SecureString>) -> Self {
        Self::RefreshToken {
            client: self.client().clone(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Returns token exchange credentials for the same client.
    #[must_use]
    pub fn exchange(&self, subject_token: impl Into<SecureString>) -> Self {
        Self::TokenExchange {
            client: self.client().clone(),
            subject_token: subject_token.into(),
            subject_token_type: default_subject_token_type(),
            audience: None,
        }
    }

    /// Renders the grant-specific form fields.
    ///
    /// Neither `grant_type`, client authentication nor `scope` are included.
    pub fn to_request_body(&self) -> FormBody {
        match self {
            Self::ClientCredentials { .. } => FormBody::new(),
            Self::ResourceOwnerPassword {
                username, password, ..
            } => FormBody::new()
                .with("username", username.as_str())
                .with("password", password.as_str()),
            Self::RefreshToken { refresh_token, .. } => {
                FormBody::new().with("refresh_token", refresh_token.as_str())
            }
            Self::TokenExchange {
                subject_token,
                subject_token_type,
                audience,
                ..
            } => {
                let mut body = FormBody::new()
                    .with("subject_token", subject_token.as_str())
                    .with("subject_token_type", subject_token_type.as_str());
                if let Some(audience) = audience {
                    body.set("audience", audience.as_str());
                }
                body
            }
        }
    }

    /// Returns a key identifying the token these credentials produce.
    pub fn key(&self) -> CredentialsKey {
        let subject = match self {
            Self::ResourceOwnerPassword { username, .. } => Some(username.clone()),
            _ => None,
        };
        CredentialsKey {
            grant_type: self.grant_type(),
            client_id: self.client_id().to_string(),
            subject,
            scopes: self.scopes().to_vec(),
        }
    }
}

/// Cache key for tokens obtained with some [`Credentials`]; never contains a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialsKey {
    grant_type: GrantType,
    client_id: String,
    subject: Option<String>,
    scopes: Vec<String>,
}

impl fmt::Display for CredentialsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.grant_type, self.client_id)?;
        if let Some(subject) = &self.subject {
            write!(f, ":{subject}")?;
        }
        write!(f, "[{}]", self.scopes.join(" "))
    }
}
