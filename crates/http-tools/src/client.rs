//! The single HTTP client every upstream call goes through.
//!
//! [`HttpClient`] owns the base URL, the request timeout, the JSON default headers and the active
//! [`AuthStrategy`]. Every outcome (2xx, non-2xx, transport failure, auth failure) is reduced to an
//! [`ApiResponse`]; the public verb methods never return `Err` and never panic on I/O.

use crate::auth::AuthStrategy;
use crate::config::{AuthType, ServerConfig};
use crate::error::{HttpToolsError, Result};
use crate::query::{QueryParams, append_query};
use crate::semantics::HttpVerb;
use base64::Engine as _;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Fixed upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call request options.
///
/// Which fields a verb honours: `body` for POST/PUT/PATCH, `query_params` for GET, `headers` for
/// all. `body: Some(Value::Null)` sends a literal JSON `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequestOptions {
    pub path: String,
    pub body: Option<Value>,
    pub query_params: Option<QueryParams>,
    pub headers: Option<HashMap<String, String>>,
}

impl ApiRequestOptions {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query_params(mut self, query_params: QueryParams) -> Self {
        self.query_params = Some(query_params);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Normalized outcome of an upstream call.
///
/// Invariant: `success == true` iff `error` is `None`; on failure `data` is `None`.
/// `status` is `0` when no HTTP status is known (network, request or auth failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(status: u16, data: T, headers: HashMap<String, String>) -> Self {
        Self {
            success: true,
            status,
            data: Some(data),
            error: None,
            headers: Some(headers),
        }
    }

    #[must_use]
    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            data: None,
            error: Some(error.into()),
            headers: None,
        }
    }
}

/// Classification of a failed upstream exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A response arrived with a non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    /// The request was sent but no response was received (connect failure, timeout, reset).
    #[error("Network error: {0}")]
    Network(String),
    /// The request could not be constructed.
    #[error("Request error: {0}")]
    Request(String),
    /// The auth strategy failed to sign the request.
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ClientError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Http { .. } => "HTTP_ERROR",
            ClientError::Network(_) => "NETWORK_ERROR",
            ClientError::Request(_) => "REQUEST_ERROR",
            ClientError::Auth(_) => "AUTH_ERROR",
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Http { status, .. } => *status,
            _ => 0,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    base_url: String,
    auth: AuthStrategy,
    client: Client,
}

impl HttpClient {
    /// Build a client for `config` using [`DEFAULT_TIMEOUT`].
    ///
    /// The strategy is expected to have passed [`AuthStrategy::validate`] already.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute URL or the HTTP client cannot be built.
    pub fn new(config: &ServerConfig, auth: AuthStrategy) -> Result<Self> {
        Self::with_timeout(config, auth, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute URL or the HTTP client cannot be built.
    pub fn with_timeout(
        config: &ServerConfig,
        auth: AuthStrategy,
        timeout: Duration,
    ) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            HttpToolsError::Config(format!("Invalid baseUrl '{}': {e}", config.base_url))
        })?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| HttpToolsError::Client(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                base_url: config.base_url.clone(),
                auth,
                client,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Base URL with any userinfo, query and fragment removed, safe to show or log.
    #[must_use]
    pub fn redacted_base_url(&self) -> String {
        Url::parse(&self.inner.base_url)
            .map(|u| redact_url(&u))
            .unwrap_or_else(|_| self.inner.base_url.clone())
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.inner.auth.auth_type()
    }

    /// GET `path`, appending `query_params` as a form-encoded query string. `body` is ignored.
    pub async fn get(&self, options: ApiRequestOptions) -> ApiResponse {
        self.send(HttpVerb::Get, options).await
    }

    /// POST `body` as JSON. `query_params` is ignored.
    pub async fn post(&self, options: ApiRequestOptions) -> ApiResponse {
        self.send(HttpVerb::Post, options).await
    }

    /// PUT `body` as JSON. `query_params` is ignored.
    pub async fn put(&self, options: ApiRequestOptions) -> ApiResponse {
        self.send(HttpVerb::Put, options).await
    }

    /// PATCH `body` as JSON. `query_params` is ignored.
    pub async fn patch(&self, options: ApiRequestOptions) -> ApiResponse {
        self.send(HttpVerb::Patch, options).await
    }

    /// DELETE `path`. `body` and `query_params` are ignored.
    pub async fn delete(&self, options: ApiRequestOptions) -> ApiResponse {
        self.send(HttpVerb::Delete, options).await
    }

    /// Plain GET for best-effort callers. Same outcome as [`HttpClient::get`], but failures are
    /// only logged at debug level.
    pub async fn get_quiet(&self, path: &str) -> ApiResponse {
        match self.request(HttpVerb::Get, ApiRequestOptions::new(path)).await {
            Ok(resp) => resp,
            Err(err) => {
                debug!(
                    path = %path_for_log(path),
                    code = err.code(),
                    status = err.status(),
                    "quiet GET failed"
                );
                failure_response(HttpVerb::Get, &err)
            }
        }
    }

    async fn send(&self, verb: HttpVerb, options: ApiRequestOptions) -> ApiResponse {
        let log_path = path_for_log(&options.path).to_string();
        match self.request(verb, options).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(
                    method = verb.as_str(),
                    path = %log_path,
                    code = err.code(),
                    status = err.status(),
                    "upstream request failed"
                );
                failure_response(verb, &err)
            }
        }
    }

    async fn request(
        &self,
        verb: HttpVerb,
        options: ApiRequestOptions,
    ) -> std::result::Result<ApiResponse, ClientError> {
        let ApiRequestOptions {
            path,
            body,
            query_params,
            headers,
        } = options;
        let path = match query_params {
            Some(params) if verb.accepts_query_params() => append_query(&path, &params),
            _ => path,
        };
        let body = body.filter(|_| verb.accepts_body());
        self.execute(verb.method(), &path, body.as_ref(), headers.as_ref())
            .await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> std::result::Result<ApiResponse, ClientError> {
        let url = build_url(&self.inner.base_url, path)?;
        let headers = caller_headers(headers)?;
        let headers = self
            .inner
            .auth
            .apply_auth(&headers)
            .map_err(|e| ClientError::Auth(e.to_string()))?;

        debug!(
            method = %method,
            url = %redact_url(&url),
            auth = %self.inner.auth.auth_type(),
            "sending upstream request"
        );

        let mut request = self.inner.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();
        let response_headers = flatten_headers(response.headers());

        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
        let data = decode_body(&bytes, content_type.as_deref());

        Ok(ApiResponse::ok(status.as_u16(), data, response_headers))
    }
}

/// Join `path` onto the base URL. Dot segments may not climb above the base URL's own path.
fn build_url(base_url: &str, path: &str) -> std::result::Result<Url, ClientError> {
    let joined = if path.starts_with('/') {
        format!("{}{path}", base_url.trim_end_matches('/'))
    } else {
        format!("{}/{path}", base_url.trim_end_matches('/'))
    };
    let url =
        Url::parse(&joined).map_err(|e| ClientError::Request(format!("Invalid URL '{path}': {e}")))?;

    let base = Url::parse(base_url)
        .map_err(|e| ClientError::Request(format!("Invalid baseUrl '{base_url}': {e}")))?;
    let prefix = base.path().trim_end_matches('/');
    let resolved = url.path();
    if resolved != prefix && !resolved.starts_with(&format!("{prefix}/")) {
        return Err(ClientError::Request(format!(
            "Invalid URL '{path}': resolves outside the base URL path"
        )));
    }
    Ok(url)
}

/// Path without query or fragment, for logs.
fn path_for_log(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn failure_response(verb: HttpVerb, err: &ClientError) -> ApiResponse {
    ApiResponse::failure(err.status(), format!("{verb} request failed: {err}"))
}

fn caller_headers(
    headers: Option<&HashMap<String, String>>,
) -> std::result::Result<HeaderMap, ClientError> {
    let mut out = HeaderMap::new();
    for (name, value) in headers.into_iter().flatten() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::Request(format!("Invalid header name '{name}'")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::Request(format!("Invalid value for header '{name}'")))?;
        out.insert(header_name, header_value);
    }
    Ok(out)
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

/// JSON when the body parses as JSON, text otherwise, base64 for non-UTF-8 payloads.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        Err(_) => json!({
            "encoding": "base64",
            "mimeType": content_type,
            "data": base64::engine::general_purpose::STANDARD.encode(bytes),
        }),
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> ClientError {
    let msg = describe_reqwest_error(&e);
    if e.is_builder() {
        ClientError::Request(msg)
    } else if e.is_timeout() {
        ClientError::Network(format!("request timed out ({msg})"))
    } else {
        ClientError::Network(msg)
    }
}

/// Error text including its source chain, with any URL redacted.
fn describe_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        let part = s.to_string();
        if !msg.contains(&part) {
            msg.push_str(": ");
            msg.push_str(&part);
        }
        source = s.source();
    }
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

/// Drop credentials, query and fragment from `url`.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}
