//! HTTP transport for the MCP server.
//!
//! A streamable-HTTP endpoint at `/mcp` (JSON-RPC POST, SSE GET with
//! `Last-Event-ID` replay, DELETE to close a session) gated by bearer
//! authentication against the embedded OAuth server, plus the OAuth
//! endpoints themselves, which are deliberately unauthenticated.

use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::oauth::handlers as oauth_handlers;
use super::oauth::{AuthorizationServer, ClientRegistry, GrantStore, TokenStore};
use super::session::SessionManager;
use crate::tools::{McpTool, ToolContext};

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into() }),
            id,
        }
    }
}

/// MCP tool info for the tools/list response.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub tools: Vec<Box<dyn McpTool>>,
    pub ctx: ToolContext,
    pub sessions: Arc<SessionManager>,
    /// Base URL for metadata documents and challenge headers.
    pub base_url: String,
    /// The embedded OAuth authorization server.
    pub oauth: AuthorizationServer,
}

/// Create the HTTP router for MCP.
pub fn create_router(
    tools: Vec<Box<dyn McpTool>>,
    ctx: ToolContext,
    base_url: Option<String>,
    bearer_token: Option<String>,
) -> Router {
    let sessions = Arc::new(SessionManager::new());
    Arc::clone(&sessions).start_cleanup_task();

    if bearer_token.is_none() {
        tracing::warn!(
            "No MCP_BEARER_TOKEN configured; consent submissions will be rejected \
             and no identity can be granted"
        );
    }

    let oauth = AuthorizationServer::new(
        ClientRegistry::new(),
        GrantStore::new(),
        TokenStore::new(),
        bearer_token,
    );
    oauth.start_cleanup_task();

    let base_url = base_url.unwrap_or_else(|| "http://localhost:8000".to_string());

    let state = Arc::new(HttpState { tools, ctx, sessions, base_url, oauth });

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // OAuth discovery + flow endpoints, no bearer gate
        .route(
            "/.well-known/oauth-protected-resource",
            get(oauth_handlers::handle_protected_resource),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(oauth_handlers::handle_server_metadata),
        )
        .route("/oauth/register", post(oauth_handlers::handle_register))
        .route("/oauth/authorize", get(oauth_handlers::handle_authorize))
        .route("/oauth/authorize/submit", post(oauth_handlers::handle_authorize_submit))
        .route("/oauth/token", post(oauth_handlers::handle_token))
        // Streamable HTTP transport, bearer-gated
        .route("/mcp", post(handle_mcp_post).get(handle_mcp_get).delete(handle_mcp_delete))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tastytrade-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "oauth": true
    }))
}

/// Check the bearer credential on a resource request.
///
/// Accepts the operator secret or any token minted by the OAuth server.
/// Failures produce a 401 carrying the `WWW-Authenticate` challenge
/// pointing at the protected-resource metadata (RFC 6750 / RFC 9728).
async fn authenticate(state: &HttpState, headers: &HeaderMap) -> Result<(), Response> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = bearer else {
        return Err(unauthorized(state, None));
    };

    if state.oauth.is_operator_secret(token) {
        return Ok(());
    }
    if state.oauth.validate_bearer(token).await.is_some() {
        return Ok(());
    }

    Err(unauthorized(state, Some("invalid_token")))
}

fn unauthorized(state: &HttpState, error: Option<&str>) -> Response {
    let metadata_url = format!("{}/.well-known/oauth-protected-resource", state.base_url);
    let challenge = match error {
        Some(code) => format!(r#"Bearer error="{code}", resource_metadata="{metadata_url}""#),
        None => format!(r#"Bearer resource_metadata="{metadata_url}""#),
    };
    let body = error.unwrap_or("unauthorized");

    (
        StatusCode::UNAUTHORIZED,
        [("WWW-Authenticate", challenge)],
        Json(serde_json::json!({ "error": body })),
    )
        .into_response()
}

fn session_id_header(headers: &HeaderMap) -> Option<&str> {
    headers.get("Mcp-Session-Id").and_then(|v| v.to_str().ok())
}

/// Handle POST requests to /mcp (JSON-RPC over streamable HTTP).
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(req): Json<JsonRpcRequest>,
) -> Response {
    if let Err(challenge) = authenticate(&state, &headers).await {
        return challenge;
    }

    tracing::debug!(method = %req.method, "Handling MCP POST request");

    let session = state.sessions.get_or_create_session(session_id_header(&headers)).await;
    let is_notification = req.id.is_none();

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(req.id, &req.params),
        "notifications/initialized" | "initialized" | "notifications/cancelled" => {
            if is_notification {
                return StatusCode::ACCEPTED.into_response();
            }
            JsonRpcResponse::success(req.id, serde_json::json!({}))
        }
        "tools/list" => handle_tools_list(req.id, &state.tools),
        "tools/call" => {
            let tool_response =
                handle_tools_call(req.id.clone(), &req.params, &state.tools, &state.ctx).await;

            // Buffer tool results so an SSE reconnect can replay them.
            if let Some(ref result) = tool_response.result {
                let event_data = serde_json::to_string(&JsonRpcResponse::success(
                    req.id.clone(),
                    result.clone(),
                ))
                .unwrap_or_default();
                session.push_event("message", event_data).await;
            }

            tool_response
        }
        "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
        _ => {
            if is_notification {
                return StatusCode::ACCEPTED.into_response();
            }
            JsonRpcResponse::error(req.id, -32601, format!("Method not found: {}", req.method))
        }
    };

    let mut res = Json(response).into_response();
    if let Ok(value) = axum::http::HeaderValue::from_str(&session.id) {
        res.headers_mut().insert("Mcp-Session-Id", value);
    }
    res
}

/// Handle GET requests to /mcp (SSE stream for server-initiated messages).
async fn handle_mcp_get(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> Response {
    if let Err(challenge) = authenticate(&state, &headers).await {
        return challenge;
    }

    let last_event_id: u64 = headers
        .get("Last-Event-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let session = state.sessions.get_or_create_session(session_id_header(&headers)).await;

    tracing::info!(session_id = %session.id, last_event_id, "New SSE stream connection");

    let stream = build_sse_stream(session, last_event_id).await;

    (
        [
            ("X-Accel-Buffering", "no"),
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
        ],
        Sse::new(stream)
            .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")),
    )
        .into_response()
}

/// Handle DELETE requests to /mcp (close a session).
async fn handle_mcp_delete(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> Response {
    if let Err(challenge) = authenticate(&state, &headers).await {
        return challenge;
    }

    if let Some(id) = session_id_header(&headers) {
        state.sessions.remove_session(id).await;
    }
    StatusCode::OK.into_response()
}

/// Build an SSE stream: replay missed events, then live events.
async fn build_sse_stream(
    session: Arc<super::session::Session>,
    last_event_id: u64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let missed = session.get_events_after(last_event_id).await;
    let replay_stream =
        stream::iter(missed.into_iter().map(|e| Ok::<_, Infallible>(e.to_sse_event())));

    let receiver = session.subscribe();
    let live_stream = BroadcastStream::new(receiver).filter_map(|result| async move {
        match result {
            Ok(event) => Some(Ok(event.to_sse_event())),
            Err(e) => {
                tracing::debug!(error = %e, "Broadcast lag, client will catch up");
                None
            }
        }
    });

    replay_stream.chain(live_stream)
}

pub(crate) fn handle_initialize(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
) -> JsonRpcResponse {
    let protocol_version =
        params.get("protocolVersion").and_then(|v| v.as_str()).unwrap_or("2024-11-05");

    tracing::info!(protocol_version, "MCP initialize");

    JsonRpcResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": "tastytrade-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

pub(crate) fn handle_tools_list(
    id: Option<serde_json::Value>,
    tools: &[Box<dyn McpTool>],
) -> JsonRpcResponse {
    let tool_list: Vec<McpToolInfo> = tools
        .iter()
        .map(|t| McpToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_list }))
}

pub(crate) async fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> JsonRpcResponse {
    let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, -32602, "Missing 'name' parameter");
    };

    let arguments = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));

    let Some(tool) = tools.iter().find(|t| t.name() == tool_name) else {
        return JsonRpcResponse::error(id, -32602, format!("Tool not found: {tool_name}"));
    };

    tracing::info!(tool = %tool_name, "Executing tool");

    match tool.execute(ctx, arguments).await {
        Ok(result) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": result
                }]
            }),
        ),
        Err(e) => {
            tracing::error!(tool = %tool_name, error = %e, "Tool execution failed");
            JsonRpcResponse::error(id, -32000, e.to_user_message())
        }
    }
}
