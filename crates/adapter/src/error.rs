//! Error types for the MCP server.

use restbridge_http_tools::auth::AuthError;
use restbridge_http_tools::error::HttpToolsError;
use thiserror::Error;

/// Main error type for the server.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Configuration errors (missing/invalid settings, conflicting auth options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials rejected by the selected auth strategy (fatal at startup)
    #[error("Authentication configuration error: {0}")]
    Auth(#[from] AuthError),

    /// Startup errors (transport failed to initialize)
    #[error("Startup error: {0}")]
    Startup(String),

    /// Runtime errors (transport task failed)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Core construction errors (client or tool schemas)
    #[error(transparent)]
    Tools(#[from] HttpToolsError),
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
