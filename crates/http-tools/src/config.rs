//! Validated upstream configuration consumed by the core.
//!
//! Loading (CLI flags, environment variables) lives in the adapter; this module only describes
//! the resulting settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authentication scheme selected for the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Basic,
    Token,
    None,
}

impl AuthType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthType::Basic => "basic",
            AuthType::Token => "token",
            AuthType::None => "none",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthType::Basic),
            "token" => Ok(AuthType::Token),
            "none" => Ok(AuthType::None),
            other => Err(format!(
                "unsupported auth type '{other}' (expected one of: basic, token, none)"
            )),
        }
    }
}

/// Username/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for the single upstream REST API this server bridges to.
///
/// Only the auxiliary field matching `auth_type` is expected to be populated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub base_url: String,
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthCredentials>,
}

impl ServerConfig {
    /// Config for an unauthenticated upstream.
    #[must_use]
    pub fn unauthenticated(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_type: AuthType::None,
            auth_token: None,
            basic_auth: None,
        }
    }

    /// Config for a bearer-token upstream.
    #[must_use]
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_type: AuthType::Token,
            auth_token: Some(token.into()),
            basic_auth: None,
        }
    }

    /// Config for a Basic-auth upstream.
    #[must_use]
    pub fn with_basic(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            auth_type: AuthType::Basic,
            auth_token: None,
            basic_auth: Some(BasicAuthCredentials {
                username: username.into(),
                password: password.into(),
            }),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("base_url", &self.base_url)
            .field("auth_type", &self.auth_type)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("basic_auth", &self.basic_auth)
            .finish()
    }
}
