//! MCP server surface: tools, resources and stdio serving.

use crate::discovery::Discovery;
use crate::error::{AdapterError, Result};
use restbridge_http_tools::auth::AuthStrategy;
use restbridge_http_tools::client::HttpClient;
use restbridge_http_tools::config::ServerConfig;
use restbridge_http_tools::tools::ApiToolSet;
use rmcp::model::{
    Annotated, CallToolRequestParams, CallToolResult, JsonObject, ListResourcesResult,
    ListToolsResult, PaginatedRequestParams, RawResource, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt as _};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

pub const SERVER_NAME: &str = "restbridge-mcp";
pub const CONFIG_URI: &str = "restbridge://config";
pub const ENDPOINTS_URI: &str = "restbridge://endpoints";

const JSON_MIME: &str = "application/json";
const MARKDOWN_MIME: &str = "text/markdown";

const TOOL_USAGE: &str = "\
## Tools

- `api_get`: `path`, optional `queryParams` (string values) and `headers`.
- `api_post`, `api_put`, `api_patch`: `path`, optional JSON `body` and `headers`.
- `api_delete`: `path` and optional `headers`.

Paths are resolved against the base URL. Every call returns a JSON envelope with `success`.
";

/// The MCP server: five verb tools over one shared HTTP client, plus discovery resources.
#[derive(Clone)]
pub struct RestBridge {
    inner: Arc<RestBridgeInner>,
}

struct RestBridgeInner {
    config: ServerConfig,
    client: HttpClient,
    tools: ApiToolSet,
    discovery: Discovery,
}

impl RestBridge {
    /// Validate credentials, build the client and tools, and start discovery when enabled.
    ///
    /// Must be called from within a Tokio runtime when `discovery_enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Auth`] when the configured credentials are unusable, or an error if
    /// the client or tool schemas cannot be built.
    pub fn start(config: ServerConfig, discovery_enabled: bool) -> Result<Self> {
        let auth = AuthStrategy::from_config(&config);
        auth.validate()?;

        let client = HttpClient::new(&config, auth)?;
        let discovery = if discovery_enabled {
            Discovery::spawn(client.clone())
        } else {
            Discovery::disabled()
        };
        Self::from_parts(config, client, discovery)
    }

    /// Assemble a server from an already-built client and discovery handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool schemas cannot be built.
    pub fn from_parts(config: ServerConfig, client: HttpClient, discovery: Discovery) -> Result<Self> {
        let tools = ApiToolSet::new(&client)?;
        info!(
            base_url = %client.redacted_base_url(),
            auth = %client.auth_type(),
            discovery = discovery.is_enabled(),
            "server ready"
        );
        Ok(Self {
            inner: Arc::new(RestBridgeInner {
                config,
                client,
                tools,
                discovery,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn discovery(&self) -> &Discovery {
        &self.inner.discovery
    }

    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.inner.tools.list_tools()
    }

    /// Dispatch a tool call by name.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_params` error for an unknown tool. Every other outcome, including
    /// upstream and validation failures, is an envelope inside `Ok`.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let Some(tool) = self.inner.tools.find(name) else {
            return Err(ErrorData::invalid_params(format!("Unknown tool: {name}"), None));
        };
        Ok(tool.handle_call(arguments).await)
    }

    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = vec![
            resource(
                CONFIG_URI,
                "config",
                "Base URL, auth type and tool names of this server",
                JSON_MIME,
            ),
            resource(
                ENDPOINTS_URI,
                "endpoints",
                "Upstream endpoints found by probing well-known paths",
                MARKDOWN_MIME,
            ),
        ];
        for probe in self.inner.discovery.available() {
            let uri = format!("{ENDPOINTS_URI}{}", probe.path);
            let description = probe
                .summary
                .clone()
                .unwrap_or_else(|| format!("Response of GET {}", probe.path));
            resources.push(resource(&uri, &format!("GET {}", probe.path), &description, JSON_MIME));
        }
        resources
    }

    /// Read one of the resources listed by [`RestBridge::resources`].
    ///
    /// # Errors
    ///
    /// Returns a `resource_not_found` error for any other URI.
    pub fn read(&self, uri: &str) -> std::result::Result<ReadResourceResult, ErrorData> {
        let (text, mime) = if uri == CONFIG_URI {
            (pretty(&self.config_summary()), JSON_MIME)
        } else if uri == ENDPOINTS_URI {
            let mut doc = self
                .inner
                .discovery
                .render_markdown(&self.inner.client.redacted_base_url());
            doc.push('\n');
            doc.push_str(TOOL_USAGE);
            (doc, MARKDOWN_MIME)
        } else if let Some(body) = uri
            .strip_prefix(ENDPOINTS_URI)
            .filter(|path| path.starts_with('/'))
            .and_then(|path| self.inner.discovery.endpoint_body(path))
        {
            (pretty(&body), JSON_MIME)
        } else {
            return Err(ErrorData::resource_not_found(
                format!("Unknown resource: {uri}"),
                None,
            ));
        };

        Ok(ReadResourceResult {
            contents: vec![text_contents(uri, mime, text)],
        })
    }

    /// Non-secret view of the configuration.
    #[must_use]
    pub fn config_summary(&self) -> Value {
        json!({
            "baseUrl": self.inner.client.redacted_base_url(),
            "authType": self.inner.config.auth_type,
            "tools": self.inner.tools.names(),
            "discovery": self.inner.discovery.is_enabled(),
        })
    }
}

impl ServerHandler for RestBridge {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            instructions: Some(format!(
                "Calls the REST API at {} with api_get, api_post, api_put, api_patch and api_delete. \
                 Paths are relative to that base URL. Read {ENDPOINTS_URI} for discovered endpoints.",
                self.inner.client.redacted_base_url()
            )),
            ..Default::default()
        };
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        self.call(&request.name, request.arguments).await
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: self.resources(),
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ReadResourceResult, ErrorData> {
        self.read(&request.uri)
    }
}

/// Serve `bridge` over stdin/stdout until the client disconnects or ctrl-c arrives.
///
/// # Errors
///
/// Returns [`AdapterError::Startup`] if the MCP handshake fails, or [`AdapterError::Runtime`] if the
/// service task ends abnormally.
pub async fn serve_stdio(bridge: RestBridge) -> Result<()> {
    let service = bridge
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| AdapterError::Startup(e.to_string()))?;
    info!("serving MCP over stdio");

    tokio::select! {
        res = service.waiting() => {
            let reason = res.map_err(|e| {
                error!(error = %e, "MCP service task failed");
                AdapterError::Runtime(e.to_string())
            })?;
            info!(?reason, "MCP client disconnected");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }
    Ok(())
}

fn resource(uri: &str, name: &str, description: &str, mime: &str) -> Resource {
    let mut raw = RawResource::new(uri.to_string(), name.to_string());
    raw.description = Some(description.to_string());
    raw.mime_type = Some(mime.to_string());
    Annotated::new(raw, None)
}

fn text_contents(uri: &str, mime: &str, text: String) -> ResourceContents {
    let mut contents = ResourceContents::text(text, uri.to_string());
    if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
        *mime_type = Some(mime.to_string());
    }
    contents
}

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ProbeResult;
    use restbridge_http_tools::response::envelope_json;
    use restbridge_test_support::StubServer;

    fn bridge_for(base_url: &str, discovery: Discovery) -> RestBridge {
        let config = ServerConfig::with_token(base_url, "secret-token");
        let client = HttpClient::new(&config, AuthStrategy::from_config(&config)).expect("client");
        RestBridge::from_parts(config, client, discovery).expect("bridge")
    }

    fn text_of(result: &ReadResourceResult) -> String {
        match &result.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => text.clone(),
            ResourceContents::BlobResourceContents { .. } => panic!("expected text contents"),
        }
    }

    fn health_probe() -> ProbeResult {
        ProbeResult {
            path: "/health".to_string(),
            status: 200,
            available: true,
            content_type: Some("application/json".to_string()),
            summary: Some("status: ok".to_string()),
            body: Some(json!({"status": "ok"})),
        }
    }

    #[test]
    fn info_names_server_and_capabilities() {
        let bridge = bridge_for("https://api.example.com", Discovery::disabled());
        let info = bridge.get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        let instructions = info.instructions.expect("instructions");
        assert!(instructions.contains("https://api.example.com"));
    }

    #[test]
    fn lists_the_five_verb_tools() {
        let bridge = bridge_for("https://api.example.com", Discovery::disabled());
        let names: Vec<String> = bridge.tools().into_iter().map(|t| t.name.to_string()).collect();
        assert_eq!(
            names,
            vec!["api_get", "api_post", "api_put", "api_patch", "api_delete"]
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let bridge = bridge_for("https://api.example.com", Discovery::disabled());
        let err = bridge.call("api_head", None).await.unwrap_err();
        assert_eq!(err.message, "Unknown tool: api_head");
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn call_dispatches_with_auth() {
        let server = StubServer::echo().await.expect("stub");
        let bridge = bridge_for(server.base_url(), Discovery::disabled());

        let mut args = JsonObject::new();
        args.insert("path".to_string(), json!("/things/7"));
        let result = bridge.call("api_get", Some(args)).await.expect("known tool");
        assert_ne!(result.is_error, Some(true));

        let envelope = envelope_json(&result).expect("envelope");
        assert_eq!(envelope["status"], 200);
        assert_eq!(envelope["data"]["path"], "/things/7");
        assert_eq!(
            envelope["data"]["headers"]["authorization"],
            "Bearer secret-token"
        );
    }

    #[tokio::test]
    async fn validation_failures_stay_inside_the_envelope() {
        let bridge = bridge_for("https://api.example.com", Discovery::disabled());
        let result = bridge.call("api_delete", None).await.expect("known tool");
        assert_eq!(result.is_error, Some(true));
        let envelope = envelope_json(&result).expect("envelope");
        assert_eq!(envelope["error"], "Invalid arguments: path: Required");
    }

    #[test]
    fn config_resource_never_leaks_credentials() {
        let bridge = bridge_for("https://api.example.com/v1", Discovery::disabled());
        let read = bridge.read(CONFIG_URI).expect("config resource");
        let text = text_of(&read);
        assert!(!text.contains("secret-token"));

        let parsed: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(parsed["baseUrl"], "https://api.example.com/v1");
        assert_eq!(parsed["authType"], "token");
        assert_eq!(parsed["tools"][0], "api_get");
        assert_eq!(parsed["discovery"], false);
    }

    #[test]
    fn endpoint_resources_follow_discovery() {
        let bridge = bridge_for(
            "https://api.example.com",
            Discovery::completed(vec![health_probe()]),
        );

        let uris: Vec<String> = bridge.resources().into_iter().map(|r| r.raw.uri).collect();
        assert_eq!(
            uris,
            vec![
                CONFIG_URI.to_string(),
                ENDPOINTS_URI.to_string(),
                "restbridge://endpoints/health".to_string()
            ]
        );

        let md = text_of(&bridge.read(ENDPOINTS_URI).expect("endpoints"));
        assert!(md.contains("| `/health` | 200 | yes |"));
        assert!(md.contains("`api_delete`"));

        let body = text_of(&bridge.read("restbridge://endpoints/health").expect("health"));
        let parsed: Value = serde_json::from_str(&body).expect("json");
        assert_eq!(parsed, json!({"status": "ok"}));
    }

    #[test]
    fn pending_discovery_lists_only_static_resources() {
        let bridge = bridge_for("https://api.example.com", Discovery::pending());
        assert_eq!(bridge.resources().len(), 2);
        let md = text_of(&bridge.read(ENDPOINTS_URI).expect("endpoints"));
        assert!(md.contains("still running"));
        assert!(bridge.read("restbridge://endpoints/health").is_err());
    }

    #[test]
    fn unknown_resource_is_not_found() {
        let bridge = bridge_for("https://api.example.com", Discovery::completed(vec![health_probe()]));
        for uri in ["restbridge://nope", "restbridge://endpointshealth", "file:///etc/passwd"] {
            let err = bridge.read(uri).unwrap_err();
            assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);
        }
    }

    #[test]
    fn start_rejects_unusable_credentials() {
        let config = ServerConfig {
            base_url: "https://api.example.com".to_string(),
            auth_type: restbridge_http_tools::config::AuthType::Token,
            auth_token: Some("   ".to_string()),
            basic_auth: None,
        };
        let err = RestBridge::start(config, false).err().expect("auth error");
        assert!(matches!(err, AdapterError::Auth(_)));
        assert_eq!(
            err.to_string(),
            "Authentication configuration error: Token authentication requires a non-empty token"
        );
    }
}
