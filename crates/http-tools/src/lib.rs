//! REST verbs exposed as MCP tools.
//!
//! This crate is the transport-agnostic core used by `restbridge-mcp`:
//! - [`auth`]: authentication strategies applied to every outbound request
//! - [`client`]: the HTTP client that reduces every outcome to an [`client::ApiResponse`]
//! - [`tools`]: per-verb tools (strict argument validation + dispatch)
//! - [`response`]: tool-call result envelopes
//!
//! It intentionally contains **no** MCP transport/session handling and reads no environment.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod response;
pub mod semantics;
pub mod tools;
pub mod validation;
