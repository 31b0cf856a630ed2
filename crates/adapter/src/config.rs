//! Command-line / environment configuration.

use crate::error::{AdapterError, Result};
use clap::{Parser, ValueEnum};
use restbridge_http_tools::config::{AuthType, BasicAuthCredentials, ServerConfig};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Expose a REST API to MCP clients as `api_get`, `api_post`, `api_put`, `api_patch` and
/// `api_delete` tools over stdio.
#[derive(Debug, Clone, Parser)]
#[command(name = "restbridge-mcp", version, about)]
pub struct Cli {
    /// Absolute base URL of the upstream API.
    #[arg(long, env = "API_BASE_URL")]
    pub base_url: String,

    /// Authentication scheme: basic, token or none.
    #[arg(long, env = "API_AUTH_TYPE")]
    pub auth_type: AuthType,

    /// Bearer token (required for `token`).
    #[arg(long, env = "API_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Basic auth username (required for `basic`).
    #[arg(long, env = "API_BASIC_AUTH_USERNAME")]
    pub basic_username: Option<String>,

    /// Basic auth password (required for `basic`).
    #[arg(long, env = "API_BASIC_AUTH_PASSWORD", hide_env_values = true)]
    pub basic_password: Option<String>,

    /// Default log filter; `RUST_LOG` takes precedence. Logs go to stderr.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Skip probing well-known upstream paths for resources.
    #[arg(long)]
    pub no_discovery: bool,
}

impl Cli {
    /// Check the settings and keep only the credentials the selected auth type uses.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Config`] for a non-absolute/non-HTTP base URL or missing credentials.
    pub fn into_server_config(self) -> Result<ServerConfig> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            AdapterError::Config(format!("Invalid API_BASE_URL '{}': {e}", self.base_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AdapterError::Config(format!(
                "Invalid API_BASE_URL '{}': unsupported scheme '{}'",
                self.base_url,
                url.scheme()
            )));
        }

        let config = match self.auth_type {
            AuthType::None => {
                if self.auth_token.is_some()
                    || self.basic_username.is_some()
                    || self.basic_password.is_some()
                {
                    debug!("auth type is 'none'; ignoring configured credentials");
                }
                ServerConfig::unauthenticated(self.base_url)
            }
            AuthType::Token => {
                let Some(token) = self.auth_token.filter(|t| !t.is_empty()) else {
                    return Err(AdapterError::Config(
                        "API_AUTH_TOKEN is required when API_AUTH_TYPE is 'token'".to_string(),
                    ));
                };
                if self.basic_username.is_some() || self.basic_password.is_some() {
                    debug!("auth type is 'token'; ignoring basic auth credentials");
                }
                ServerConfig::with_token(self.base_url, token)
            }
            AuthType::Basic => {
                let (Some(username), Some(password)) = (
                    self.basic_username.filter(|u| !u.is_empty()),
                    self.basic_password.filter(|p| !p.is_empty()),
                ) else {
                    return Err(AdapterError::Config(
                        "API_BASIC_AUTH_USERNAME and API_BASIC_AUTH_PASSWORD are required when API_AUTH_TYPE is 'basic'"
                            .to_string(),
                    ));
                };
                if self.auth_token.is_some() {
                    debug!("auth type is 'basic'; ignoring API_AUTH_TOKEN");
                }
                ServerConfig {
                    base_url: self.base_url,
                    auth_type: AuthType::Basic,
                    auth_token: None,
                    basic_auth: Some(BasicAuthCredentials { username, password }),
                }
            }
        };

        Ok(config)
    }
}
