//! The embedded CRM tool host: the HTTP side of the tool-host wire protocol.
//!
//! Answers `initialize`, `tools/list`, and `tools/call` on a single POST
//! endpoint. Unknown methods and tools get `-32601`, malformed call params
//! `-32602`, internal failures `-32603`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use mcp::protocol::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use mcp::{CallToolParams, JsonRpcRequest, JsonRpcResponse};

use crate::crm::CrmClient;

const CONTACT_TOOL: &str = "get_contact_details";

#[derive(Clone)]
pub struct ToolHostState {
    pub crm: Arc<CrmClient>,
}

pub fn routes(state: ToolHostState) -> Router {
    Router::new()
        .route("/", post(rpc))
        .route("/health", get(health))
        .with_state(state)
}

async fn rpc(
    State(state): State<ToolHostState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    Json(dispatch(request, &state.crm).await)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "type": "http_tool_host"
    }))
}

fn contact_tool_descriptor() -> Value {
    json!({
        "name": CONTACT_TOOL,
        "description": "Get CRM contact details by contact ID.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "contact_id": {
                    "type": "string",
                    "description": "The contact ID to fetch details for"
                }
            },
            "required": ["contact_id"]
        }
    })
}

pub(crate) async fn dispatch(request: JsonRpcRequest, crm: &CrmClient) -> JsonRpcResponse {
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => JsonRpcResponse::ok(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "crm-http", "version": env!("CARGO_PKG_VERSION") }
            }),
        ),

        "tools/list" => JsonRpcResponse::ok(id, json!({ "tools": [contact_tool_descriptor()] })),

        "tools/call" => {
            let params: CallToolParams = match serde_json::from_value(request.params) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::err(id, INVALID_PARAMS, format!("Invalid params: {e}"));
                }
            };

            if params.name != CONTACT_TOOL {
                return JsonRpcResponse::err(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", params.name),
                );
            }

            let Some(contact_id) = params.arguments.get("contact_id").and_then(Value::as_str)
            else {
                return JsonRpcResponse::err(
                    id,
                    INVALID_PARAMS,
                    "Missing required parameter: contact_id",
                );
            };

            let details = crm.contact_details(contact_id).await;
            match serde_json::to_string_pretty(&details) {
                Ok(text) => JsonRpcResponse::ok(
                    id,
                    json!({ "content": [{ "type": "text", "text": text }] }),
                ),
                Err(e) => JsonRpcResponse::err(id, INTERNAL_ERROR, format!("Internal error: {e}")),
            }
        }

        other => JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("Unknown method: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp::RequestId;

    fn crm() -> CrmClient {
        // Unroutable upstream so calls exercise the fallback path.
        CrmClient::new("http://127.0.0.1:9/api/contact", None).unwrap()
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(1, method, params)
    }

    #[tokio::test]
    async fn initialize_reports_identity_and_tools_capability() {
        let response = dispatch(request("initialize", json!({})), &crm()).await;
        let result = response.into_result().unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "crm-http");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn listing_advertises_the_contact_tool() {
        let response = dispatch(request("tools/list", json!({})), &crm()).await;
        let result = response.into_result().unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "get_contact_details");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "contact_id");
    }

    #[tokio::test]
    async fn unknown_method_is_32601() {
        let response = dispatch(request("resources/list", json!({})), &crm()).await;
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert!(err.message.contains("resources/list"));
    }

    #[tokio::test]
    async fn unknown_tool_is_32601() {
        let params = json!({"name": "send_invoice", "arguments": {}});
        let response = dispatch(request("tools/call", params), &crm()).await;
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert!(err.message.contains("send_invoice"));
    }

    #[tokio::test]
    async fn missing_contact_id_is_32602() {
        let params = json!({"name": "get_contact_details", "arguments": {}});
        let response = dispatch(request("tools/call", params), &crm()).await;
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn call_returns_text_content_with_contact_payload() {
        let params = json!({"name": "get_contact_details", "arguments": {"contact_id": "42"}});
        let response = dispatch(request("tools/call", params), &crm()).await;
        let result = response.into_result().unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["id"], "42");
    }

    #[tokio::test]
    async fn response_id_echoes_the_request_id() {
        let mut req = request("tools/list", json!({}));
        req.id = RequestId::Number(99);
        let response = dispatch(req, &crm()).await;
        assert_eq!(response.id, RequestId::Number(99));
    }
}
