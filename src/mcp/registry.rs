//! Tool registry and invoker
//!
//! A [`ToolRegistry`] pairs the ordered list of tool descriptors with a table
//! mapping each tool name to its handler. It is produced once by a
//! [`ToolCatalog`] and never mutated afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::error;

use crate::error::{McpError, Result};
use crate::mcp::types::{Tool, ToolInvocationResult};

/// Future returned by a tool handler
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// A bound tool handler: takes the call arguments, resolves to the raw result
pub type ToolHandler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// Wrap an async closure as a [`ToolHandler`]
pub fn handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

/// Deserialize tool arguments into a typed struct
///
/// `null` is treated as an empty argument object.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| {
        McpError::InvalidArguments {
            message: e.to_string(),
        }
        .into()
    })
}

/// Supplies the tool set of a server variant
///
/// `load` is called at most once per successful session initialization;
/// `shutdown` releases whatever the catalog's collaborators hold.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    async fn load(&self) -> Result<ToolRegistry>;

    async fn shutdown(&self) {}
}

/// Ordered tool descriptors plus their handler table
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with its handler
    pub fn register(&mut self, tool: Tool, handler: ToolHandler) -> Result<()> {
        if self.handlers.contains_key(&tool.name) {
            return Err(McpError::DuplicateTool { name: tool.name }.into());
        }
        self.handlers.insert(tool.name.clone(), handler);
        self.tools.push(tool);
        Ok(())
    }

    /// All descriptors, in registration order
    pub fn list_tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve a tool name to its handler
    pub fn resolve(&self, name: &str) -> Result<ToolHandler> {
        self.handlers.get(name).cloned().ok_or_else(|| {
            McpError::UnknownTool {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Invoke a tool and wrap the outcome in the uniform envelope
    ///
    /// Handler errors never escape: they are logged and reported as
    /// `{success: false, error}`.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolInvocationResult {
        let outcome = match self.resolve(name) {
            Ok(handler) => handler(arguments).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => ToolInvocationResult::ok(result),
            Err(e) => {
                error!(tool = name, error = %e, "Error in tool");
                ToolInvocationResult::failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}
