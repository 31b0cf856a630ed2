//! Construction-time errors for `restbridge-http-tools`.
//!
//! Per-request failures never use this type: they are reduced to
//! [`ApiResponse`](crate::client::ApiResponse) or a tool-call error envelope instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpToolsError {
    /// Configuration errors (invalid base URL, invalid auth settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// A tool's argument schema failed to compile.
    #[error("Schema error: {0}")]
    Schema(String),
}

/// Result type alias for construction-time operations.
pub type Result<T> = std::result::Result<T, HttpToolsError>;

/// Failure while handling a single tool call, before the HTTP exchange.
///
/// Upstream failures are [`ApiResponse`](crate::client::ApiResponse) values and panics are caught
/// at the dispatcher, so argument validation is the only error path here.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments violate the tool's strict schema. Carries the `, `-joined violations.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
