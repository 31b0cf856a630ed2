//! Authentication strategies applied to every outbound request.
//!
//! A strategy is built once from the [`ServerConfig`], validated once at startup, and then shared
//! read-only by the [`HttpClient`](crate::client::HttpClient).

use crate::config::{AuthType, ServerConfig};
use base64::Engine as _;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Credentials failed validation (fatal at startup).
    #[error("{0}")]
    Configuration(String),
    /// The strategy could not sign a request.
    #[error("{0}")]
    Apply(String),
}

/// Closed set of supported authentication strategies.
///
/// Credentials are optional at the type level so that an incomplete config can still be turned
/// into a strategy and then rejected by [`AuthStrategy::validate`] with a precise message.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    None,
    Basic {
        username: Option<String>,
        password: Option<String>,
    },
    Token {
        token: Option<String>,
    },
}

impl AuthStrategy {
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthStrategy::Basic {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        AuthStrategy::Token {
            token: Some(token.into()),
        }
    }

    /// Select the strategy named by `config.auth_type`, carrying only that type's credentials.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        match config.auth_type {
            AuthType::None => AuthStrategy::None,
            AuthType::Token => AuthStrategy::Token {
                token: config.auth_token.clone(),
            },
            AuthType::Basic => {
                let creds = config.basic_auth.as_ref();
                AuthStrategy::Basic {
                    username: creds.map(|c| c.username.clone()),
                    password: creds.map(|c| c.password.clone()),
                }
            }
        }
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        match self {
            AuthStrategy::None => AuthType::None,
            AuthStrategy::Basic { .. } => AuthType::Basic,
            AuthStrategy::Token { .. } => AuthType::Token,
        }
    }

    /// Check the locally held credentials.
    ///
    /// Call once, before the strategy signs any request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] describing the first invalid credential.
    pub fn validate(&self) -> Result<(), AuthError> {
        match self {
            AuthStrategy::None => Ok(()),
            AuthStrategy::Basic { username, password } => {
                if username.as_deref().is_none_or(str::is_empty) {
                    return Err(AuthError::Configuration(
                        "Basic authentication requires a valid username".to_string(),
                    ));
                }
                if password.as_deref().is_none_or(str::is_empty) {
                    return Err(AuthError::Configuration(
                        "Basic authentication requires a valid password".to_string(),
                    ));
                }
                Ok(())
            }
            AuthStrategy::Token { token } => match token.as_deref() {
                None => Err(AuthError::Configuration(
                    "Token authentication requires a valid token".to_string(),
                )),
                Some(t) if t.trim().is_empty() => Err(AuthError::Configuration(
                    "Token authentication requires a non-empty token".to_string(),
                )),
                Some(_) => Ok(()),
            },
        }
    }

    /// Return a copy of `headers` with this strategy's credentials merged in.
    ///
    /// The input map is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Apply`] if credentials are missing or cannot be encoded as a header
    /// value.
    pub fn apply_auth(&self, headers: &HeaderMap) -> Result<HeaderMap, AuthError> {
        let mut out = headers.clone();
        match self {
            AuthStrategy::None => {}
            AuthStrategy::Basic { username, password } => {
                let (Some(username), Some(password)) = (username, password) else {
                    return Err(AuthError::Apply(
                        "Basic authentication credentials are not configured".to_string(),
                    ));
                };
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                out.insert(AUTHORIZATION, sensitive_value(&format!("Basic {encoded}"))?);
            }
            AuthStrategy::Token { token } => {
                let Some(token) = token else {
                    return Err(AuthError::Apply(
                        "Token authentication credentials are not configured".to_string(),
                    ));
                };
                out.insert(AUTHORIZATION, sensitive_value(&format!("Bearer {token}"))?);
            }
        }
        Ok(out)
    }
}

fn sensitive_value(raw: &str) -> Result<HeaderValue, AuthError> {
    let mut value = HeaderValue::from_str(raw).map_err(|_| {
        AuthError::Apply("credentials contain characters not allowed in an HTTP header".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::None => f.write_str("AuthStrategy::None"),
            AuthStrategy::Basic { username, .. } => f
                .debug_struct("AuthStrategy::Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthStrategy::Token { .. } => f
                .debug_struct("AuthStrategy::Token")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
