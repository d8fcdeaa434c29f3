//! Client authentication request builders.
//!
//! Each builder turns credentials and a partial form body into the HTTP
//! authentication and final body for one [`AuthMethod`](crate::AuthMethod).
//! Builders perform no I/O; time and randomness come from the [`BuildContext`].

use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use url::Url;

use crate::{Clock, Credentials, FormBody, HttpAuth, IdGenerator, TokenError};

/// `client_assertion_type` value for JWT bearer client assertions (RFC 7523).
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Default lifetime of a client assertion.
pub const DEFAULT_ASSERTION_TTL: Duration = Duration::from_secs(1000);

/// Output of a request builder: optional HTTP authentication and the final body.
pub type AuthAndBody = (Option<HttpAuth>, FormBody);

/// A client authentication request builder.
pub type RequestBuilder =
    fn(&Credentials, &BuildContext<'_>, FormBody) -> Result<AuthAndBody, TokenError>;

/// Everything a builder may depend on besides the credentials.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Token endpoint, the audience of client assertions.
    pub token_endpoint: &'a Url,
    /// Time source for assertion expiry.
    pub clock: &'a dyn Clock,
    /// Source of assertion identifiers.
    pub ids: &'a dyn IdGenerator,
    /// Lifetime of client assertions.
    pub assertion_ttl: Duration,
}

/// `client_secret_basic`: HTTP Basic with `client_id` and the secret (or an empty one).
///
/// # Errors
///
/// Never fails.
pub fn client_secret_basic(
    credentials: &Credentials,
    _context: &BuildContext<'_>,
    body: FormBody,
) -> Result<AuthAndBody, TokenError> {
    let password = credentials
        .client_secret()
        .cloned()
        .unwrap_or_else(|| "".into());
    let auth = HttpAuth::basic(credentials.client_id(), password);
    Ok((Some(auth), body))
}

/// `client_secret_post`: `client_id` and, if not empty, `client_secret` in the body.
///
/// # Errors
///
/// Never fails.
pub fn client_secret_post(
    credentials: &Credentials,
    _context: &BuildContext<'_>,
    mut body: FormBody,
) -> Result<AuthAndBody, TokenError> {
    body.set("client_id", credentials.client_id());
    if let Some(secret) = credentials
        .client_secret()
        .filter(|secret| !secret.is_empty())
    {
        body.set("client_secret", secret.as_str());
    }
    Ok((None, body))
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    jti: String,
    exp: i64,
}

/// `client_secret_jwt`: an HS256 JWT signed with the client secret, sent as
/// `client_assertion`.
///
/// # Errors
///
/// Returns [`TokenError::ClientAssertion`] if the credentials have no client
/// secret or the assertion cannot be signed.
pub fn client_secret_jwt(
    credentials: &Credentials,
    context: &BuildContext<'_>,
    mut body: FormBody,
) -> Result<AuthAndBody, TokenError> {
    let secret = credentials
        .client_secret()
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| TokenError::ClientAssertion {
            reason: format!(
                "client '{}' has no client secret to sign with",
                credentials.client_id()
            ),
        })?;

    let ttl = i64::try_from(context.assertion_ttl.as_secs()).unwrap_or(i64::MAX);
    let claims = AssertionClaims {
        iss: credentials.client_id(),
        sub: credentials.client_id(),
        aud: context.token_endpoint.as_str(),
        jti: context.ids.generate().to_string(),
        exp: context.clock.now().as_second().saturating_add(ttl),
    };

    let assertion = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_str().as_bytes()),
    )
    .map_err(|err| TokenError::ClientAssertion {
        reason: err.to_string(),
    })?;

    body.set("client_assertion_type", JWT_BEARER_ASSERTION_TYPE);
    body.set("client_assertion", assertion);
    Ok((None, body))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use jiff::Timestamp;
    use jsonwebtoken::{DecodingKey, Validation};
    use serde::Deserialize;
    use uuid::Uuid;

    use super::*;
    use crate::{FixedClock, FixedIdGenerator};

    const JTI: Uuid = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);

    struct Fixture {
        endpoint: Url,
        clock: FixedClock,
        ids: FixedIdGenerator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                endpoint: Url::parse("https://auth.example.com/token").expect("valid url"),
                clock: FixedClock::new(
                    Timestamp::from_second(1_700_000_000).expect("valid timestamp"),
                ),
                ids: FixedIdGenerator(JTI),
            }
        }

        fn context(&self) -> BuildContext<'_> {
            BuildContext {
                token_endpoint: &self.endpoint,
                clock: &self.clock,
                ids: &self.ids,
                assertion_ttl: DEFAULT_ASSERTION_TTL,
            }
        }
    }

    fn base_body() -> FormBody {
        FormBody::new().with("grant_type", "client_credentials")
    }

    #[test]
    fn should_build_basic_auth_without_touching_body() {
        let fixture = Fixture::new();
        let credentials = Credentials::client_credentials("app", "secret");

        let (auth, body) =
            client_secret_basic(&credentials, &fixture.context(), base_body()).expect("build");

        assert_eq!(auth, Some(HttpAuth::basic("app", "secret")));
        assert_eq!(body, base_body());
    }

    #[test]
    fn should_build_basic_auth_with_empty_secret_for_public_client() {
        let fixture = Fixture::new();
        let credentials = Credentials::password("public-app", "jdoe", "pwd");

        let (auth, _) =
            client_secret_basic(&credentials, &fixture.context(), base_body()).expect("build");

        assert_eq!(auth, Some(HttpAuth::basic("public-app", "")));
    }

    #[test]
    fn should_put_client_credentials_in_body_for_post() {
        let fixture = Fixture::new();
        let credentials = Credentials::client_credentials("app", "secret");

        let (auth, body) =
            client_secret_post(&credentials, &fixture.context(), base_body()).expect("build");
        let decoded = FormBody::decode(&body.encode().expect("encode")).expect("decode");

        assert_eq!(auth, None);
        assert_eq!(decoded.get("client_id"), Some("app"));
        assert_eq!(decoded.get("client_secret"), Some("secret"));
        assert_eq!(decoded.get("grant_type"), Some("client_credentials"));
    }

    #[test]
    fn should_omit_missing_secret_for_post() {
        let fixture = Fixture::new();
        let credentials = Credentials::refresh_token("public-app", "r-1");

        let (auth, body) =
            client_secret_post(&credentials, &fixture.context(), base_body()).expect("build");

        assert_eq!(auth, None);
        assert_eq!(body.get("client_id"), Some("public-app"));
        assert!(!body.contains_key("client_secret"));
    }

    #[test]
    fn should_omit_empty_secret_for_post() {
        let fixture = Fixture::new();
        let credentials = Credentials::client_credentials("app", "");

        let (_, body) =
            client_secret_post(&credentials, &fixture.context(), base_body()).expect("build");

        assert_eq!(body.get("client_id"), Some("app"));
        assert!(!body.contains_key("client_secret"));
    }

    #[derive(Debug, Deserialize)]
    struct DecodedClaims {
        iss: String,
        sub: String,
        aud: String,
        jti: String,
        exp: i64,
    }

    fn decode_assertion(assertion: &str, secret: &str) -> jsonwebtoken::errors::Result<DecodedClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&["https://auth.example.com/token"]);
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        jsonwebtoken::decode::<DecodedClaims>(
            assertion,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    #[test]
    fn should_sign_client_assertion() {
        let fixture = Fixture::new();
        let credentials = Credentials::client_credentials("app", "a-very-long-shared-secret");

        let (auth, body) =
            client_secret_jwt(&credentials, &fixture.context(), base_body()).expect("build");

        assert_eq!(auth, None);
        assert_eq!(body.get("client_assertion_type"), Some(JWT_BEARER_ASSERTION_TYPE));
        assert!(!body.contains_key("client_secret"));

        let assertion = body.get("client_assertion").expect("assertion present");
        let claims =
            decode_assertion(assertion, "a-very-long-shared-secret").expect("valid signature");

        assert_eq!(claims.iss, "app");
        assert_eq!(claims.sub, "app");
        assert_eq!(claims.aud, "https://auth.example.com/token");
        assert_eq!(claims.jti, JTI.to_string());
        assert_eq!(claims.exp, 1_700_001_000);

        assert!(decode_assertion(assertion, "another-secret").is_err());
    }

    #[test]
    fn should_use_injected_clock_and_ttl() {
        let fixture = Fixture::new();
        fixture.clock.advance(Duration::from_secs(60));
        let context = BuildContext {
            assertion_ttl: Duration::from_secs(30),
            ..fixture.context()
        };
        let credentials = Credentials::client_credentials("app", "a-very-long-shared-secret");

        let (_, body) = client_secret_jwt(&credentials, &context, base_body()).expect("build");
        let assertion = body.get("client_assertion").expect("assertion present");
        let claims =
            decode_assertion(assertion, "a-very-long-shared-secret").expect("valid signature");

        assert_eq!(claims.exp, 1_700_000_090);
    }

    #[test]
    fn should_use_fresh_jti_per_assertion() {
        let fixture = Fixture::new();
        let ids = crate::RandomIdGenerator;
        let context = BuildContext {
            ids: &ids,
            ..fixture.context()
        };
        let credentials = Credentials::client_credentials("app", "a-very-long-shared-secret");

        let jti = |_: usize| {
            let (_, body) =
                client_secret_jwt(&credentials, &context, base_body()).expect("build");
            let assertion = body.get("client_assertion").expect("assertion present");
            decode_assertion(assertion, "a-very-long-shared-secret")
                .expect("valid signature")
                .jti
        };

        assert_ne!(jti(0), jti(1));
    }

    #[test]
    fn should_require_secret_for_client_assertion() {
        let fixture = Fixture::new();
        let credentials = Credentials::password("public-app", "jdoe", "pwd");

        let err = client_secret_jwt(&credentials, &fixture.context(), base_body())
            .expect_err("no secret");

        insta::assert_snapshot!(err, @"Cannot build client assertion: client 'public-app' has no client secret to sign with");
    }
}
