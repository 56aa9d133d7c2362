use axum::Json;
use serde_json::{Value, json};

/// GET / -> static liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "Sheets MCP running" }))
}
