//! HTTP transport for the MCP server
//!
//! `POST /mcp` carries one JSON-RPC request per call; protocol errors travel
//! inside a 200 body. The remaining routes are thin conveniences over the
//! same server instance.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::DEFAULT_CHAIN;
use crate::logging::request_logging_middleware;
use crate::mcp::server::{McpServer, SERVER_NAME, SERVER_VERSION};
use crate::mcp::types::{JsonRpcError, JsonRpcResponse};

/// Application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
}

impl AppState {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// The server, if it is ready to serve requests
    fn ready(&self) -> Result<&McpServer, HttpError> {
        if self.server.is_initialized() && !self.server.is_closed() {
            Ok(&self.server)
        } else {
            Err(HttpError::NotInitialized)
        }
    }
}

/// Infrastructure failures mapped to HTTP status codes
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("MCP server not initialized")]
    NotInitialized,

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Build the HTTP router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(root))
        .route("/mcp", post(mcp_endpoint))
        .route("/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .route("/network/info", get(network_info))
        .route("/chains", get(chains))
        .route("/stats", get(stats))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVER_NAME,
        "server_initialized": state.server.is_initialized() && !state.server.is_closed(),
    }))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "ZetaChain MCP HTTP Server",
        "version": SERVER_VERSION,
        "description": "HTTP wrapper for ZetaChain Model Context Protocol server",
        "endpoints": {
            "health": "/health",
            "tools": "/tools",
            "mcp": "/mcp",
            "chains": "/chains",
            "stats": "/stats",
            "network": "/network/info"
        }
    }))
}

async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Result<Json<JsonRpcResponse>, HttpError> {
    let server = state.ready()?;

    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(request) => server.handle_request(request).await,
        Err(e) => JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e)),
    };

    Ok(Json(response))
}

async fn list_tools(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    let tools = state.ready()?.list_tools();
    Ok(Json(json!({ "count": tools.len(), "tools": tools })))
}

#[derive(Debug, Deserialize)]
struct CallToolQuery {
    tool_name: String,
}

async fn call_tool(
    State(state): State<AppState>,
    query: std::result::Result<Query<CallToolQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    let server = state.ready()?;
    let Query(query) = query.map_err(|e| HttpError::Internal(e.body_text()))?;

    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(&body).map_err(|e| HttpError::Internal(e.to_string()))?
    };

    let result = server.call_tool(&query.tool_name, args).await;
    Ok(Json(json!({ "tool_name": query.tool_name, "result": result })))
}

#[derive(Debug, Deserialize)]
struct NetworkQuery {
    chain: Option<String>,
}

async fn network_info(
    State(state): State<AppState>,
    Query(query): Query<NetworkQuery>,
) -> Result<Json<Value>, HttpError> {
    let chain = query.chain.unwrap_or_else(|| DEFAULT_CHAIN.to_string());
    let result = state
        .ready()?
        .call_tool("get_network_info", json!({ "chain": chain }))
        .await;
    to_json(&result)
}

async fn chains(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    let result = state
        .ready()?
        .call_tool("get_supported_chains", json!({}))
        .await;
    to_json(&result)
}

async fn stats(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    let server = state.ready()?;

    let omnichain = server.call_tool("get_omnichain_stats", json!({})).await;
    let governance = server.call_tool("get_governance_stats", json!({})).await;
    let defi = server.call_tool("get_defi_stats", json!({})).await;

    let empty = || Value::Object(Map::new());
    Ok(Json(json!({
        "omnichain": omnichain.result.unwrap_or_else(empty),
        "governance": governance.result.unwrap_or_else(empty),
        "defi": defi.result.unwrap_or_else(empty),
    })))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Json<Value>, HttpError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| HttpError::Internal(e.to_string()))
}

/// Serve the router until Ctrl+C
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
