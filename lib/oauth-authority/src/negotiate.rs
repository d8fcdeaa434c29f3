//! Client authentication method negotiation.

use std::collections::HashMap;

use crate::builders::{self, RequestBuilder};
use crate::{AuthMethod, TokenError};

/// Request builders by client authentication method.
///
/// The default registry knows `client_secret_basic`, `client_secret_post` and
/// `client_secret_jwt`. A method without a builder is never selected, even if
/// the server supports it.
#[derive(Debug, Clone)]
pub struct BuilderRegistry {
    builders: HashMap<AuthMethod, RequestBuilder>,
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        let mut registry = HashMap::new();
        registry.insert(
            AuthMethod::ClientSecretBasic,
            builders::client_secret_basic as RequestBuilder,
        );
        registry.insert(
            AuthMethod::ClientSecretPost,
            builders::client_secret_post as RequestBuilder,
        );
        registry.insert(
            AuthMethod::ClientSecretJwt,
            builders::client_secret_jwt as RequestBuilder,
        );
        Self { builders: registry }
    }
}

impl BuilderRegistry {
    /// Creates a registry without any builder.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registers (or replaces) the builder for `method`.
    #[must_use]
    pub fn with_builder(mut self, method: AuthMethod, builder: RequestBuilder) -> Self {
        self.builders.insert(method, builder);
        self
    }

    /// Returns the builder for `method`.
    pub fn get(&self, method: AuthMethod) -> Option<RequestBuilder> {
        self.builders.get(&method).copied()
    }

    /// Selects the first preferred method that the server supports and that
    /// has a builder.
    ///
    /// An empty `preferred` falls back to [`AuthMethod::DEFAULT_PREFERENCE`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NoSupportedAuthMethod`] when no candidate matches.
    pub fn select(
        &self,
        preferred: &[AuthMethod],
        supported: &[AuthMethod],
    ) -> Result<(AuthMethod, RequestBuilder), TokenError> {
        let preferred = if preferred.is_empty() {
            &AuthMethod::DEFAULT_PREFERENCE[..]
        } else {
            preferred
        };

        preferred
            .iter()
            .filter(|method| supported.contains(*method))
            .find_map(|method| self.get(*method).map(|builder| (*method, builder)))
            .ok_or_else(|| TokenError::NoSupportedAuthMethod {
                requested: preferred.to_vec(),
                supported: supported.to_vec(),
            })
    }
}

/// Selects a client authentication method using the default builders.
///
/// First match wins: the result is the first element of `preferred` (or of
/// [`AuthMethod::DEFAULT_PREFERENCE`] when empty) that appears in `supported`.
///
/// # Errors
///
/// Returns [`TokenError::NoSupportedAuthMethod`] when no candidate matches.
pub fn select(preferred: &[AuthMethod], supported: &[AuthMethod]) -> Result<AuthMethod, TokenError> {
    BuilderRegistry::default()
        .select(preferred, supported)
        .map(|(method, _)| method)
}
