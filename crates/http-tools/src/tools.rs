//! One MCP tool per HTTP verb.
//!
//! A tool validates its arguments against the verb's closed schema, forwards the call to the
//! shared [`HttpClient`], and formats the outcome (or any failure) into a result envelope. Calls are
//! stateless and may run concurrently.

use crate::client::{ApiRequestOptions, HttpClient};
use crate::error::{Result, ToolError};
use crate::response::{format_api_response, format_panic, format_tool_error};
use crate::semantics::{HttpVerb, annotations_for_verb};
use crate::validation::ArgumentSchema;
use futures::FutureExt as _;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

#[must_use]
pub fn tool_name(verb: HttpVerb) -> &'static str {
    match verb {
        HttpVerb::Get => "api_get",
        HttpVerb::Post => "api_post",
        HttpVerb::Put => "api_put",
        HttpVerb::Patch => "api_patch",
        HttpVerb::Delete => "api_delete",
    }
}

fn tool_description(verb: HttpVerb) -> &'static str {
    match verb {
        HttpVerb::Get => {
            "Make a GET request to the configured REST API. Supports query parameters and custom headers."
        }
        HttpVerb::Post => {
            "Make a POST request to the configured REST API. Sends an optional JSON body and custom headers."
        }
        HttpVerb::Put => {
            "Make a PUT request to the configured REST API to replace a resource. Sends an optional JSON body and custom headers."
        }
        HttpVerb::Patch => {
            "Make a PATCH request to the configured REST API to partially update a resource. Sends an optional JSON body and custom headers."
        }
        HttpVerb::Delete => {
            "Make a DELETE request to the configured REST API. Accepts only a path and custom headers."
        }
    }
}

pub struct ApiTool {
    verb: HttpVerb,
    schema: ArgumentSchema,
    client: HttpClient,
}

impl ApiTool {
    /// # Errors
    ///
    /// Returns an error if the verb's argument schema fails to compile.
    pub fn new(verb: HttpVerb, client: HttpClient) -> Result<Self> {
        Ok(Self {
            verb,
            schema: ArgumentSchema::for_verb(verb)?,
            client,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        tool_name(self.verb)
    }

    /// The MCP tool definition advertised in `tools/list`.
    #[must_use]
    pub fn definition(&self) -> Tool {
        let schema_obj = self
            .schema
            .input_schema()
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name(), tool_description(self.verb), Arc::new(schema_obj));
        tool.annotations = Some(annotations_for_verb(self.verb));
        tool
    }

    /// Handle a `tools/call` for this tool. Always yields an envelope; never panics outward.
    pub async fn handle_call(&self, arguments: Option<JsonObject>) -> CallToolResult {
        settle(self.name(), self.dispatch(arguments.as_ref())).await
    }

    async fn dispatch(
        &self,
        arguments: Option<&JsonObject>,
    ) -> std::result::Result<CallToolResult, ToolError> {
        let args = self.schema.validate(arguments)?;
        let options = ApiRequestOptions {
            path: args.path,
            body: args.body,
            query_params: args.query_params,
            headers: args.headers,
        };

        let resp = match self.verb {
            HttpVerb::Get => self.client.get(options).await,
            HttpVerb::Post => self.client.post(options).await,
            HttpVerb::Put => self.client.put(options).await,
            HttpVerb::Patch => self.client.patch(options).await,
            HttpVerb::Delete => self.client.delete(options).await,
        };

        info!(
            tool = self.name(),
            status = resp.status,
            success = resp.success,
            "tool call finished"
        );
        Ok(format_api_response(&resp))
    }
}

/// Await a dispatch and reduce every outcome, panics included, to an envelope.
async fn settle<F>(tool: &'static str, call: F) -> CallToolResult
where
    F: Future<Output = std::result::Result<CallToolResult, ToolError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!(tool, error = %err, "rejected tool arguments");
            format_tool_error(&err)
        }
        Err(panic) => {
            error!(tool, "tool call panicked");
            format_panic(panic.as_ref())
        }
    }
}

/// The five verb tools sharing one client.
pub struct ApiToolSet {
    tools: Vec<ApiTool>,
}

impl ApiToolSet {
    /// # Errors
    ///
    /// Returns an error if any argument schema fails to compile.
    pub fn new(client: &HttpClient) -> Result<Self> {
        let tools = HttpVerb::ALL
            .into_iter()
            .map(|verb| ApiTool::new(verb, client.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tools })
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ApiTool::definition).collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(ApiTool::name).collect()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ApiTool> {
        self.tools.iter().find(|t| t.name() == name)
    }
}
