//! Token request form bodies.

use std::fmt;

use crate::TokenError;

/// Ordered `application/x-www-form-urlencoded` body.
///
/// Setting a key that is already present replaces its value in place, so
/// the field order on the wire is the insertion order of first occurrence.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormBody(Vec<(String, String)>);

/// Keys whose values are never printed.
const SENSITIVE_KEYS: [&str; 6] = [
    "client_secret",
    "client_assertion",
    "password",
    "refresh_token",
    "subject_token",
    "actor_token",
];

impl FormBody {
    /// Creates an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    /// Sets `key` to `value`, returning the body.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Adds every field of `other`, replacing existing keys.
    pub fn extend(&mut self, other: FormBody) {
        for (key, value) in other.0 {
            self.set(key, value);
        }
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Encodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Transport`] if encoding fails.
    pub fn encode(&self) -> Result<String, TokenError> {
        serde_urlencoded::to_string(&self.0).map_err(|err| TokenError::Transport {
            reason: format!("cannot encode form body: {err}"),
        })
    }

    /// Parses an encoded body.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Transport`] if the input is not a valid form body.
    pub fn decode(input: &str) -> Result<Self, TokenError> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(input)
            .map(Self)
            .map_err(|err| TokenError::Transport {
                reason: format!("cannot decode form body: {err}"),
            })
    }
}

impl fmt::Debug for FormBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(key, value)| {
                if SENSITIVE_KEYS.contains(&key) {
                    (key, "[REDACTED]")
                } else {
                    (key, value)
                }
            }))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for FormBody
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut body = Self::new();
        for (key, value) in iter {
            body.set(key, value);
        }
        body
    }
}
