#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use sheets_nexus::config::Config;
use sheets_nexus::mcp::{JsonRpcRequest, JsonRpcResponse};
use sheets_nexus::router::NexusState;
use sheets_nexus::store::{CredentialBackend, TokenStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::net::TcpListener;
use url::Url;

/// One request as seen by the fake Google backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub bearer: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct FakeInner {
    calls: Mutex<Vec<RecordedCall>>,
    token_reply: Mutex<Option<(StatusCode, Value)>>,
    rejected_tokens: Mutex<HashSet<String>>,
    read_values: Mutex<Value>,
}

/// Stand-in for Google's token endpoint and the Sheets values API.
#[derive(Clone, Default)]
pub struct FakeGoogle {
    inner: Arc<FakeInner>,
}

impl FakeGoogle {
    pub fn new() -> Self {
        let fake = Self::default();
        *fake.inner.read_values.lock() = json!([["name", "qty"], ["apples", "3"]]);
        fake
    }

    pub fn reply_to_token_requests(&self, status: StatusCode, body: Value) {
        *self.inner.token_reply.lock() = Some((status, body));
    }

    /// Sheets calls bearing `token` get a 401.
    pub fn reject_token(&self, token: &str) {
        self.inner.rejected_tokens.lock().insert(token.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.calls.lock().clone()
    }

    pub fn sheets_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path.starts_with("/v4/"))
            .collect()
    }

    pub fn token_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == "/token")
            .collect()
    }

    /// Serve on an ephemeral local port and return the base URL.
    pub async fn spawn(&self) -> Url {
        let app = Router::new()
            .route("/token", post(token_endpoint))
            .fallback(sheets_endpoint)
            .with_state(self.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn record(&self, method: Method, path: String, query: Option<&str>, headers: &HeaderMap, body: Value) {
        let query = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.inner.calls.lock().push(RecordedCall {
            method,
            path,
            query,
            bearer,
            body,
        });
    }
}

async fn token_endpoint(State(fake): State<FakeGoogle>, headers: HeaderMap, body: Bytes) -> Response {
    let form: serde_json::Map<String, Value> = url::form_urlencoded::parse(&body)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    fake.record(Method::POST, "/token".into(), None, &headers, Value::Object(form));

    let reply = fake.inner.token_reply.lock().clone();
    match reply {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_request"}))).into_response(),
    }
}

async fn sheets_endpoint(State(fake): State<FakeGoogle>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let headers = req.headers().clone();
    let raw = to_bytes(req.into_body(), usize::MAX).await.unwrap();
    let body = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&raw).unwrap()
    };
    fake.record(method.clone(), path.clone(), query.as_deref(), &headers, body);

    let rejected = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| fake.inner.rejected_tokens.lock().contains(token));
    if rejected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}})),
        )
            .into_response();
    }

    let range = path.rsplit('/').next().unwrap_or_default().to_string();
    match method {
        Method::GET => Json(json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": fake.inner.read_values.lock().clone(),
        }))
        .into_response(),
        Method::PUT => Json(json!({
            "spreadsheetId": "S1",
            "updatedRange": range,
            "updatedCells": 4,
        }))
        .into_response(),
        Method::POST => Json(json!({
            "spreadsheetId": "S1",
            "tableRange": "Sheet1!A1:B2",
            "updates": {"updatedRange": "Sheet1!A3:B3", "updatedCells": 2},
        }))
        .into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

pub fn test_config(google: &Url) -> Config {
    Config {
        google_client_id: "client-123".into(),
        google_client_secret: "secret-456".into(),
        base_url: Url::parse("http://nexus.test").unwrap(),
        google_auth_url: google.join("/o/oauth2/auth").unwrap(),
        google_token_url: google.join("/token").unwrap(),
        sheets_api_base: google.join("/v4/spreadsheets").unwrap(),
        ..Config::default()
    }
}

pub fn nexus_state<B>(google: &Url, backend: B) -> (NexusState, TokenStore)
where
    B: CredentialBackend + 'static,
{
    let store = TokenStore::new(backend);
    let state = NexusState::new(test_config(google), store.clone()).unwrap();
    (state, store)
}

pub async fn dispatch(state: &NexusState, request: Value) -> JsonRpcResponse {
    let request: JsonRpcRequest = serde_json::from_value(request).unwrap();
    state.dispatcher.dispatch(request).await
}
