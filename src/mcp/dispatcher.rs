use super::protocol::{
    AUTH_REQUIRED, INTERNAL_ERROR, INVALID_PARAMS, JsonRpcRequest, JsonRpcResponse,
    METHOD_NOT_FOUND, McpMethod, RequestId, UPSTREAM_ERROR,
};
use super::tools::{Tool, ToolCall, ToolCallError};
use crate::api::SheetsApi;
use crate::config::{Config, MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::error::NexusError;
use crate::service::{CredentialResolver, Resolution};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Routes JSON-RPC requests to tools on behalf of the calling user.
///
/// Holds no per-call state; every failure comes back as an error envelope.
#[derive(Clone)]
pub struct Dispatcher {
    resolver: CredentialResolver,
    sheets: SheetsApi,
    config: Arc<Config>,
}

impl Dispatcher {
    pub fn new(resolver: CredentialResolver, sheets: SheetsApi, config: Arc<Config>) -> Self {
        Self {
            resolver,
            sheets,
            config,
        }
    }

    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        match McpMethod::parse(&request.method) {
            Some(McpMethod::Initialize) => JsonRpcResponse::success(id, initialize_result()),
            Some(McpMethod::ListTools) => {
                let tools: Vec<Value> = Tool::ALL.iter().map(|t| t.descriptor()).collect();
                JsonRpcResponse::success(id, json!({ "tools": tools }))
            }
            Some(McpMethod::Ping | McpMethod::Notification) => {
                JsonRpcResponse::success(id, json!({}))
            }
            Some(McpMethod::CallTool) => self.call_tool(id, &request).await,
            None => {
                debug!(method = %request.method, "unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, "Method not found")
            }
        }
    }

    async fn call_tool(&self, id: Option<RequestId>, request: &JsonRpcRequest) -> JsonRpcResponse {
        let Some(user_id) = request.user_id() else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "user_id must be a string");
        };

        let Some(params) = request.params.clone() else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params for tools/call");
        };
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"));
            }
        };
        let call = match ToolCall::parse(&params.name, params.arguments) {
            Ok(call) => call,
            Err(e @ ToolCallError::UnknownTool(_)) => {
                debug!(tool = %params.name, "unknown tool");
                return JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {e}"));
            }
            Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
        };

        let tool = call.tool().name();
        debug!(user_id, tool, "calling tool");
        match self.execute(&user_id, &call).await {
            Ok(Resolution::Ready(result)) => JsonRpcResponse::success(id, result),
            Ok(Resolution::AuthRequired) => self.auth_required(id, &user_id),
            Err(e) => {
                warn!(user_id, tool, error = %e, "tool call failed");
                failure(id, e)
            }
        }
    }

    async fn execute(&self, user_id: &str, call: &ToolCall) -> Result<Resolution<Value>, NexusError> {
        let sheets = &self.sheets;
        let resolution = match call {
            ToolCall::ReadRange(args) => self
                .resolver
                .run_as(user_id, move |token| async move {
                    sheets
                        .get_values(token, &args.spreadsheet_id, &args.range)
                        .await
                })
                .await?
                .map(|rows| json!({ "content": [{ "type": "json", "json": rows }] })),
            ToolCall::WriteRange(args) => self
                .resolver
                .run_as(user_id, move |token| async move {
                    sheets
                        .update_values(token, &args.spreadsheet_id, &args.range, &args.values)
                        .await
                })
                .await?
                .map(|resp| {
                    let text = match resp.updated_range {
                        Some(range) => format!("Sheet updated: {range}"),
                        None => "Sheet updated".to_string(),
                    };
                    text_content(text)
                }),
            ToolCall::AppendRow(args) => self
                .resolver
                .run_as(user_id, move |token| async move {
                    sheets
                        .append_values(token, &args.spreadsheet_id, &args.range, &args.values)
                        .await
                })
                .await?
                .map(|resp| {
                    let text = match resp.updates.and_then(|u| u.updated_range) {
                        Some(range) => format!("Row appended: {range}"),
                        None => "Row appended".to_string(),
                    };
                    text_content(text)
                }),
        };
        Ok(resolution)
    }

    fn auth_required(&self, id: Option<RequestId>, user_id: &str) -> JsonRpcResponse {
        match self.config.auth_entry_url(user_id) {
            Ok(url) => JsonRpcResponse::error_with_data(
                id,
                AUTH_REQUIRED,
                format!("Google Sheets not connected for user '{user_id}'. Visit {url}"),
                json!({ "user_id": user_id, "auth_url": url.as_str() }),
            ),
            Err(e) => failure(id, e),
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
        },
    })
}

fn text_content(text: String) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

fn failure(id: Option<RequestId>, err: NexusError) -> JsonRpcResponse {
    match err {
        NexusError::UpstreamStatus { status, message } => JsonRpcResponse::error_with_data(
            id,
            UPSTREAM_ERROR,
            format!("Google Sheets API error: {message}"),
            json!({ "status": status.as_u16() }),
        ),
        e @ (NexusError::Reqwest(_)
        | NexusError::Oauth2Token(_)
        | NexusError::Oauth2Server { .. }) => {
            JsonRpcResponse::error(id, UPSTREAM_ERROR, e.to_string())
        }
        e => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
    }
}
