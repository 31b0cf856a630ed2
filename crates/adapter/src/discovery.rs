//! Best-effort endpoint discovery.
//!
//! At startup the server probes a fixed set of well-known upstream paths with plain GETs. The
//! outcome backs the `restbridge://endpoints` resources; it never gates tool calls, and probe
//! failures are recorded rather than reported.

use futures::future::join_all;
use parking_lot::RwLock;
use restbridge_http_tools::client::HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

/// Paths probed relative to the base URL.
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "/",
    "/api",
    "/health",
    "/status",
    "/version",
    "/openapi.json",
    "/swagger.json",
    "/api-docs",
];

const MAX_SUMMARY_KEYS: usize = 8;
const MAX_SUMMARY_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub path: String,
    /// HTTP status, or 0 when no response was received.
    pub status: u16,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum DiscoveryState {
    Disabled,
    Pending,
    Done(Arc<Vec<ProbeResult>>),
}

/// Shared handle to the discovery outcome.
#[derive(Debug, Clone)]
pub struct Discovery {
    state: Arc<RwLock<DiscoveryState>>,
}

impl Discovery {
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_state(DiscoveryState::Disabled)
    }

    #[must_use]
    pub fn pending() -> Self {
        Self::with_state(DiscoveryState::Pending)
    }

    /// A handle that already holds `results`.
    #[must_use]
    pub fn completed(results: Vec<ProbeResult>) -> Self {
        Self::with_state(DiscoveryState::Done(Arc::new(results)))
    }

    fn with_state(state: DiscoveryState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Probe in the background and publish the results when every probe has finished.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(client: HttpClient) -> Self {
        let discovery = Self::pending();
        let handle = discovery.clone();
        tokio::spawn(async move {
            let results = probe_all(&client).await;
            let available = results.iter().filter(|r| r.available).count();
            info!(
                probed = results.len(),
                available, "endpoint discovery finished"
            );
            handle.finish(results);
        });
        discovery
    }

    fn finish(&self, results: Vec<ProbeResult>) {
        *self.state.write() = DiscoveryState::Done(Arc::new(results));
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(*self.state.read(), DiscoveryState::Disabled)
    }

    /// Results once discovery has finished; `None` while pending or when disabled.
    #[must_use]
    pub fn results(&self) -> Option<Arc<Vec<ProbeResult>>> {
        match &*self.state.read() {
            DiscoveryState::Done(results) => Some(Arc::clone(results)),
            DiscoveryState::Disabled | DiscoveryState::Pending => None,
        }
    }

    /// Probes that answered 2xx.
    #[must_use]
    pub fn available(&self) -> Vec<ProbeResult> {
        self.results()
            .map(|results| results.iter().filter(|r| r.available).cloned().collect())
            .unwrap_or_default()
    }

    /// Body returned by an available probe of `path`.
    #[must_use]
    pub fn endpoint_body(&self, path: &str) -> Option<Value> {
        let results = self.results()?;
        results
            .iter()
            .find(|r| r.available && r.path == path)
            .map(|r| r.body.clone().unwrap_or(Value::Null))
    }

    /// Markdown report for the endpoints resource.
    #[must_use]
    pub fn render_markdown(&self, base_url: &str) -> String {
        let state = self.state.read().clone();
        let mut out = String::from("# Upstream endpoints\n\n");
        let _ = writeln!(out, "Base URL: `{base_url}`\n");

        match state {
            DiscoveryState::Disabled => {
                out.push_str("Endpoint discovery is disabled.\n");
            }
            DiscoveryState::Pending => {
                out.push_str("Endpoint discovery is still running. Read this resource again shortly.\n");
            }
            DiscoveryState::Done(results) => {
                out.push_str("| Path | Status | Available | Content type | Summary |\n");
                out.push_str("|---|---|---|---|---|\n");
                for r in results.iter() {
                    let status = if r.status == 0 {
                        "unreachable".to_string()
                    } else {
                        r.status.to_string()
                    };
                    let _ = writeln!(
                        out,
                        "| `{}` | {} | {} | {} | {} |",
                        r.path,
                        status,
                        if r.available { "yes" } else { "no" },
                        r.content_type.as_deref().unwrap_or("-"),
                        escape_cell(r.summary.as_deref().unwrap_or("-")),
                    );
                }
            }
        }
        out
    }
}

/// GET every well-known path concurrently.
pub async fn probe_all(client: &HttpClient) -> Vec<ProbeResult> {
    join_all(WELL_KNOWN_PATHS.iter().map(|path| probe(client, path))).await
}

async fn probe(client: &HttpClient, path: &str) -> ProbeResult {
    let resp = client.get_quiet(path).await;
    debug!(path, status = resp.status, success = resp.success, "probed endpoint");

    if !resp.success {
        return ProbeResult {
            path: path.to_string(),
            status: resp.status,
            available: false,
            content_type: None,
            summary: None,
            body: None,
        };
    }

    let content_type = resp
        .headers
        .as_ref()
        .and_then(|h| h.get("content-type"))
        .cloned();
    let summary = resp.data.as_ref().and_then(summarize);

    ProbeResult {
        path: path.to_string(),
        status: resp.status,
        available: true,
        content_type,
        summary,
        body: resp.data,
    }
}

/// One-line description of a probe body.
fn summarize(data: &Value) -> Option<String> {
    match data {
        Value::Object(map) => {
            if let Some(spec_version) = map
                .get("openapi")
                .or_else(|| map.get("swagger"))
                .and_then(Value::as_str)
            {
                let info = map.get("info");
                let title = info
                    .and_then(|i| i.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or("untitled");
                let mut s = format!("OpenAPI {spec_version} document: {title}");
                if let Some(version) = info.and_then(|i| i.get("version")).and_then(Value::as_str) {
                    let _ = write!(s, " ({version})");
                }
                if let Some(paths) = map.get("paths").and_then(Value::as_object) {
                    let _ = write!(s, ", {} paths", paths.len());
                }
                return Some(s);
            }
            if let Some(status) = map.get("status").and_then(scalar_text) {
                return Some(format!("status: {status}"));
            }
            if let Some(version) = map.get("version").and_then(scalar_text) {
                return Some(format!("version: {version}"));
            }
            if map.is_empty() {
                return Some("empty JSON object".to_string());
            }
            let keys: Vec<&str> = map.keys().take(MAX_SUMMARY_KEYS).map(String::as_str).collect();
            let more = if map.len() > MAX_SUMMARY_KEYS { ", ..." } else { "" };
            Some(format!("JSON object with keys: {}{more}", keys.join(", ")))
        }
        Value::Array(items) => Some(format!("JSON array with {} items", items.len())),
        Value::String(text) => {
            let line = text.lines().find(|l| !l.trim().is_empty())?.trim();
            Some(truncate(line, MAX_SUMMARY_CHARS))
        }
        Value::Null => None,
        Value::Bool(_) | Value::Number(_) => Some(data.to_string()),
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(v.to_string()),
        _ => None,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
