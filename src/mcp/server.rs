//! MCP Server implementation
//!
//! Implements the protocol dispatcher and session lifecycle shared by the
//! stdio and HTTP transports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::error::{McpError, Result};
use crate::mcp::registry::{ToolCatalog, ToolRegistry};
use crate::mcp::types::*;

/// MCP Server info
pub const SERVER_NAME: &str = "zetachain-mcp-server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for ZetaChain
///
/// All methods take `&self`; one instance is shared by every connection.
pub struct McpServer {
    /// Source of the tool set and its handlers
    catalog: Arc<dyn ToolCatalog>,

    /// Loaded tools; set exactly once by the first successful `initialize`
    registry: OnceCell<ToolRegistry>,

    /// Whether `close` has run
    closed: AtomicBool,
}

impl McpServer {
    /// Create a new MCP server around a tool catalog
    pub fn new(catalog: Arc<dyn ToolCatalog>) -> Self {
        Self {
            catalog,
            registry: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the session has been initialized
    pub fn is_initialized(&self) -> bool {
        self.registry.initialized()
    }

    /// Whether the server has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Initialize the session and return the capability payload
    ///
    /// Tools are loaded on the first call only; later calls return the same
    /// payload without touching the catalog.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        self.registry
            .get_or_try_init(|| async {
                let registry = self.catalog.load().await?;
                if registry.is_empty() {
                    warn!("Tool catalog loaded no tools");
                }
                info!(tools = registry.len(), "ZetaChain MCP Server initialized");
                Ok::<_, crate::error::ZetaMcpError>(registry)
            })
            .await?;

        Ok(InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        })
    }

    /// List all loaded tools; empty before initialization
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry
            .get()
            .map(|registry| registry.list_tools().to_vec())
            .unwrap_or_default()
    }

    /// Call a tool by name
    ///
    /// Before initialization no tool is registered, so every call reports
    /// the tool as not found.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolInvocationResult {
        match self.registry.get() {
            Some(registry) => registry.invoke(name, arguments).await,
            None => ToolRegistry::new().invoke(name, arguments).await,
        }
    }

    /// Handle a decoded JSON-RPC request
    ///
    /// Never fails: every path yields a well-formed response echoing the
    /// request id.
    pub async fn handle_request(&self, request: Value) -> JsonRpcResponse {
        let id = request
            .get("id")
            .cloned()
            .unwrap_or_else(|| Value::String(DEFAULT_REQUEST_ID.to_string()));
        let method = match request.get("method") {
            Some(Value::String(m)) => m.clone(),
            Some(other) => other.to_string(),
            None => "None".to_string(),
        };

        debug!(method = %method, "handling request");

        match self.dispatch(&method, request.get("params")).await {
            Ok(Some(result)) => JsonRpcResponse::success(id, result),
            Ok(None) => JsonRpcResponse::error(id, JsonRpcError::method_not_found(&method)),
            Err(e) => {
                error!(method = %method, error = %e, "Error handling request");
                JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string()))
            }
        }
    }

    /// Route a method; `Ok(None)` means the method is unknown
    async fn dispatch(&self, method: &str, params: Option<&Value>) -> Result<Option<Value>> {
        match method {
            methods::INITIALIZE => {
                let result = self.initialize().await?;
                Ok(Some(serde_json::to_value(result)?))
            }
            methods::LIST_TOOLS => {
                let result = ListToolsResult {
                    tools: self.list_tools(),
                };
                Ok(Some(serde_json::to_value(result)?))
            }
            methods::CALL_TOOL => {
                let params = call_tool_params(params)?;
                let envelope = self.call_tool(&params.name, params.arguments).await;
                let result = CallToolResult::from_envelope(&envelope)?;
                Ok(Some(serde_json::to_value(result)?))
            }
            _ => Ok(None),
        }
    }

    /// Close the server and release collaborator resources
    ///
    /// Only the first call does any work.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.catalog.shutdown().await;
        info!("ZetaChain MCP Server closed");
    }
}

fn call_tool_params(params: Option<&Value>) -> Result<CallToolParams> {
    let params = match params {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(McpError::InvalidParams {
                message: format!("expected an object, got {}", other),
            }
            .into())
        }
    };

    match params.get("name") {
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(McpError::InvalidParams {
                message: format!("tool name must be a string, got {}", other),
            }
            .into())
        }
        None => {
            return Err(McpError::MissingParameter {
                name: "name".to_string(),
            }
            .into())
        }
    }

    Ok(serde_json::from_value(Value::Object(params))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::registry::handler;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct CountingCatalog {
        loads: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    #[async_trait]
    impl ToolCatalog for CountingCatalog {
        async fn load(&self) -> Result<ToolRegistry> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let mut registry = ToolRegistry::new();
            registry.register(
                Tool::new("ping", "Replies pong", json!({"type": "object", "properties": {}})),
                handler(|_| async { Ok(json!("pong")) }),
            )?;
            Ok(registry)
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn server() -> (Arc<CountingCatalog>, McpServer) {
        let catalog = Arc::new(CountingCatalog {
            loads: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        });
        let server = McpServer::new(catalog.clone());
        (catalog, server)
    }

    #[test]
    fn test_server_info() {
        assert_eq!(SERVER_NAME, "zetachain-mcp-server");
    }

    #[tokio::test]
    async fn test_initialize_loads_once() {
        let (catalog, server) = server();
        assert!(!server.is_initialized());
        let first = server.initialize().await.unwrap();
        let second = server.initialize().await.unwrap();
        assert_eq!(first, second);
        assert!(server.is_initialized());
        assert_eq!(catalog.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_list_tools_empty_before_initialize() {
        let (_, server) = server();
        assert!(server.list_tools().is_empty());
        server.initialize().await.unwrap();
        assert_eq!(server.list_tools().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_id_defaults() {
        let (_, server) = server();
        let response = server.handle_request(json!({"method": "tools/list"})).await;
        assert_eq!(response.id, json!("1"));
        assert!(!response.is_error());
    }

    #[tokio::test]
    async fn test_null_id_is_echoed() {
        let (_, server) = server();
        let response = server
            .handle_request(json!({"jsonrpc": "2.0", "id": null, "method": "nope"}))
            .await;
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_call_tool_without_name_is_internal_error() {
        let (_, server) = server();
        server.initialize().await.unwrap();
        let response = server
            .handle_request(json!({"id": 3, "method": "tools/call", "params": {"arguments": {}}}))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::INTERNAL_ERROR);
        assert_eq!(error.message, "Missing required parameter: name");
        assert_eq!(response.id, json!(3));
    }

    #[tokio::test]
    async fn test_call_tool_with_non_object_params() {
        let (_, server) = server();
        let response = server
            .handle_request(json!({"id": 4, "method": "tools/call", "params": [1, 2]}))
            .await;
        assert_eq!(response.error.unwrap().code, error_codes::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (catalog, server) = server();
        server.close().await;
        server.close().await;
        assert!(server.is_closed());
        assert_eq!(catalog.shutdowns.load(Ordering::SeqCst), 1);
    }
}
