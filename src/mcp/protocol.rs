//! JSON-RPC message types

use crate::config::DEFAULT_USER_ID;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// Remote service (Google) rejected or failed the call.
pub const UPSTREAM_ERROR: i32 = -32000;
/// HTTP-style code: the acting user has no credential on file.
pub const AUTH_REQUIRED: i32 = 401;

/// Request ID. Strings and integers keep their type; any other JSON value
/// (fractions, integers past `i64`) is echoed back exactly as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Other(Value),
}

/// Inbound JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Caller metadata. Kept raw so a malformed field only matters to the
    /// methods that read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl JsonRpcRequest {
    /// Acting user: `meta.user_id`, then `params._meta.user_id`, then the default user.
    ///
    /// Numbers are taken as their decimal text. `None` when the id has any other shape.
    pub fn user_id(&self) -> Option<String> {
        let from_meta = self
            .meta
            .as_ref()
            .and_then(|m| m.get("user_id"))
            .filter(|v| !v.is_null());
        let from_params = || {
            self.params
                .as_ref()
                .and_then(|p| p.pointer("/_meta/user_id"))
                .filter(|v| !v.is_null())
        };
        match from_meta.or_else(from_params) {
            None => Some(DEFAULT_USER_ID.to_string()),
            Some(Value::String(s)) if s.is_empty() => Some(DEFAULT_USER_ID.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => None,
        }
    }

    /// Notifications carry no id and expect no reply body.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }
}

/// Methods the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    ListTools,
    CallTool,
    Ping,
    Notification,
}

impl McpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Self::Initialize),
            "tools/list" => Some(Self::ListTools),
            "tools/call" => Some(Self::CallTool),
            "ping" => Some(Self::Ping),
            m if m.starts_with("notifications/") => Some(Self::Notification),
            _ => None,
        }
    }
}

/// JSON-RPC response: exactly one of `result` or `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    #[must_use]
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn error_with_data(
        id: Option<RequestId>,
        code: i32,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: Some(data),
            }),
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }

    /// HTTP status for the transport. Unparseable bodies and unknown methods or
    /// tools are a 400; every other outcome travels as a 200 envelope.
    pub fn http_status(&self) -> StatusCode {
        match self.error_code() {
            Some(METHOD_NOT_FOUND | PARSE_ERROR) => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        }
    }
}

/// JSON-RPC error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: Value) -> JsonRpcRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn user_id_prefers_meta_then_params_then_default() {
        let r = request(json!({
            "id": 1, "method": "tools/call",
            "params": {"_meta": {"user_id": "bob"}},
            "meta": {"user_id": "alice"}
        }));
        assert_eq!(r.user_id().as_deref(), Some("alice"));

        let r = request(json!({"id": 1, "method": "tools/call", "params": {"_meta": {"user_id": "bob"}}}));
        assert_eq!(r.user_id().as_deref(), Some("bob"));

        let r = request(json!({"id": 1, "method": "tools/call"}));
        assert_eq!(r.user_id().as_deref(), Some(DEFAULT_USER_ID));

        let r = request(json!({"id": 1, "method": "tools/call", "meta": {"user_id": ""}}));
        assert_eq!(r.user_id().as_deref(), Some(DEFAULT_USER_ID));
    }

    #[test]
    fn ids_keep_their_json_type() {
        let r = request(json!({"id": "abc", "method": "ping"}));
        assert_eq!(r.id, Some(RequestId::String("abc".into())));
        let out = serde_json::to_value(JsonRpcResponse::success(r.id, json!({}))).unwrap();
        assert_eq!(out["id"], "abc");

        let r = request(json!({"id": 42, "method": "ping"}));
        let out = serde_json::to_value(JsonRpcResponse::error(r.id, METHOD_NOT_FOUND, "x")).unwrap();
        assert_eq!(out["id"], 42);
        assert_eq!(out["jsonrpc"], "2.0");
        assert!(out.get("result").is_none());
    }

    #[test]
    fn user_id_accepts_numbers_and_rejects_other_shapes() {
        let r = request(json!({"id": 1, "method": "tools/call", "meta": {"user_id": 42}}));
        assert_eq!(r.user_id().as_deref(), Some("42"));

        let r = request(json!({"id": 1, "method": "tools/call", "meta": {"user_id": ["a"]}}));
        assert_eq!(r.user_id(), None);

        let r = request(json!({"id": 1, "method": "tools/call", "meta": "alice"}));
        assert_eq!(r.user_id().as_deref(), Some(DEFAULT_USER_ID));
    }

    #[test]
    fn non_integer_ids_are_echoed_verbatim() {
        for id in [json!(1.5), json!(18446744073709551615u64), json!({"k": 1})] {
            let r = request(json!({"id": id.clone(), "method": "initialize"}));
            assert_eq!(r.id, Some(RequestId::Other(id.clone())));
            let out = serde_json::to_value(JsonRpcResponse::success(r.id, json!({}))).unwrap();
            assert_eq!(out["id"], id);
        }

        let r = request(json!({"id": null, "method": "notifications/initialized"}));
        assert!(r.id.is_none());
        assert!(r.is_notification());
    }

    #[test]
    fn only_unroutable_requests_map_to_bad_request() {
        let status = |code| JsonRpcResponse::error(None, code, "x").http_status();
        assert_eq!(status(PARSE_ERROR), StatusCode::BAD_REQUEST);
        assert_eq!(status(METHOD_NOT_FOUND), StatusCode::BAD_REQUEST);
        assert_eq!(status(INVALID_REQUEST), StatusCode::OK);
        assert_eq!(status(INVALID_PARAMS), StatusCode::OK);
        assert_eq!(status(AUTH_REQUIRED), StatusCode::OK);
    }

    #[test]
    fn method_parsing() {
        assert_eq!(McpMethod::parse("initialize"), Some(McpMethod::Initialize));
        assert_eq!(McpMethod::parse("tools/list"), Some(McpMethod::ListTools));
        assert_eq!(
            McpMethod::parse("notifications/initialized"),
            Some(McpMethod::Notification)
        );
        assert_eq!(McpMethod::parse("unknown"), None);
    }
}
