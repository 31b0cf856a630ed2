//! `restbridge-mcp`: an MCP stdio server that exposes a configured REST API as five verb tools
//! (`api_get`, `api_post`, `api_put`, `api_patch`, `api_delete`).
//!
//! The tool semantics live in `restbridge-http-tools`; this crate adds configuration, logging,
//! the rmcp server handler and best-effort endpoint discovery.

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod server;

pub use error::{AdapterError, Result};
pub use server::{RestBridge, serve_stdio};
