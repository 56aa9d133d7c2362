use crate::mcp::protocol::{INVALID_REQUEST, PARSE_ERROR};
use crate::mcp::{JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::router::NexusState;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::debug;

/// POST /mcp -> one JSON-RPC request in, one envelope out.
///
/// The body is parsed by hand so malformed input still gets a JSON-RPC error
/// rather than a framework rejection.
pub async fn mcp_handler(State(state): State<NexusState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return reply(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    let id = payload
        .get("id")
        .cloned()
        .and_then(|v| serde_json::from_value::<Option<RequestId>>(v).ok().flatten());
    let request: JsonRpcRequest = match serde_json::from_value(payload) {
        Ok(r) => r,
        Err(e) => {
            return reply(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ));
        }
    };

    debug!(method = %request.method, id = ?request.id, "mcp request");
    if request.is_notification() {
        state.dispatcher.dispatch(request).await;
        return StatusCode::ACCEPTED.into_response();
    }
    reply(state.dispatcher.dispatch(request).await)
}

fn reply(response: JsonRpcResponse) -> Response {
    (response.http_status(), Json(response)).into_response()
}
