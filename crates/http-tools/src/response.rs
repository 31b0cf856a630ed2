//! Tool-call result envelopes.
//!
//! Every tool call ends in a single text content item holding pretty-printed JSON, either
//! `{success: true, status, data, headers}` or `{success: false, error, details?}`. Failures also
//! set `isError` on the MCP result.

use crate::client::ApiResponse;
use crate::error::ToolError;
use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use std::any::Any;

const UNKNOWN_API_ERROR: &str = "Unknown API error";
const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Format an [`ApiResponse`] according to its `success` flag.
#[must_use]
pub fn format_api_response(resp: &ApiResponse) -> CallToolResult {
    if resp.success {
        format_success(resp)
    } else {
        format_api_failure(resp)
    }
}

#[must_use]
pub fn format_success(resp: &ApiResponse) -> CallToolResult {
    let body = json!({
        "success": true,
        "status": resp.status,
        "data": resp.data.clone().unwrap_or(Value::Null),
        "headers": resp.headers.clone().unwrap_or_default(),
    });
    CallToolResult::success(vec![Content::text(pretty(&body))])
}

/// Upstream failure: `details` carries the HTTP status (0 when none was received).
#[must_use]
pub fn format_api_failure(resp: &ApiResponse) -> CallToolResult {
    let error = resp.error.as_deref().unwrap_or(UNKNOWN_API_ERROR);
    format_error(error, Some(json!({ "status": resp.status })))
}

/// Rejected arguments: the message only, no `details`.
#[must_use]
pub fn format_tool_error(err: &ToolError) -> CallToolResult {
    format_error(&err.to_string(), None)
}

/// A panic caught at the dispatcher boundary.
#[must_use]
pub fn format_panic(payload: &(dyn Any + Send)) -> CallToolResult {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
    format_error(&message, Some(json!({ "name": "Panic" })))
}

#[must_use]
pub fn format_error(message: &str, details: Option<Value>) -> CallToolResult {
    let mut body = json!({
        "success": false,
        "error": message,
    });
    if let Some(details) = details {
        body["details"] = details;
    }
    CallToolResult::error(vec![Content::text(pretty(&body))])
}

/// Parse the JSON envelope back out of a tool result's first text item.
#[must_use]
pub fn envelope_json(result: &CallToolResult) -> Option<Value> {
    let text = result.content.first()?.as_text()?;
    serde_json::from_str(&text.text).ok()
}

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn success_round_trips_through_text() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let resp = ApiResponse::ok(200, json!({"id": 1, "title": "x"}), headers);

        let result = format_api_response(&resp);
        assert_ne!(result.is_error, Some(true));

        let parsed = envelope_json(&result).expect("json text");
        assert_eq!(parsed["success"], json!(true));
        assert_eq!(parsed["status"], json!(resp.status));
        assert_eq!(Some(&parsed["data"]), resp.data.as_ref());
        assert_eq!(parsed["headers"]["content-type"], "application/json");
    }

    #[test]
    fn success_text_is_pretty_printed() {
        let resp = ApiResponse::ok(201, json!({"a": 1}), HashMap::new());
        let result = format_success(&resp);
        let text = &result.content[0].as_text().expect("text").text;
        assert!(text.contains('\n'));
        assert!(text.starts_with("{\n  \"success\": true"));
    }

    #[test]
    fn api_failure_carries_status_details() {
        let resp: ApiResponse = ApiResponse::failure(404, "GET request failed: HTTP 404: Not Found");
        let result = format_api_response(&resp);
        assert_eq!(result.is_error, Some(true));

        let parsed = envelope_json(&result).expect("json text");
        assert_eq!(
            parsed,
            json!({
                "success": false,
                "error": "GET request failed: HTTP 404: Not Found",
                "details": {"status": 404}
            })
        );
    }

    #[test]
    fn api_failure_without_message_uses_fallback() {
        let resp: ApiResponse = ApiResponse {
            success: false,
            status: 0,
            data: None,
            error: None,
            headers: None,
        };
        let parsed = envelope_json(&format_api_failure(&resp)).expect("json text");
        assert_eq!(parsed["error"], "Unknown API error");
    }

    #[test]
    fn validation_error_has_no_details() {
        let err = ToolError::InvalidArguments("path: Required".to_string());
        let result = format_tool_error(&err);
        assert_eq!(result.is_error, Some(true));
        let parsed = envelope_json(&result).expect("json text");
        assert_eq!(parsed["error"], "Invalid arguments: path: Required");
        assert!(parsed.get("details").is_none());
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let parsed = envelope_json(&format_panic(payload.as_ref())).expect("json text");
        assert_eq!(parsed["error"], "boom");
        assert_eq!(parsed["details"]["name"], "Panic");

        let payload: Box<dyn Any + Send> = Box::new(17_u8);
        let parsed = envelope_json(&format_panic(payload.as_ref())).expect("json text");
        assert_eq!(parsed["error"], "Unknown error occurred");
    }
}
