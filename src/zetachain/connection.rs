//! Chain connection management
//!
//! Talks to the EVM JSON-RPC endpoint of every configured chain. The first
//! query probes all chains and keeps the reachable ones; `close` forgets them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{ChainConfig, Config};
use crate::error::{ChainError, Result};
use crate::zetachain::timeout::with_timeout;

/// Low-level JSON-RPC backend
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Perform one JSON-RPC call against `rpc_url` and return its `result`
    async fn call(&self, rpc_url: &str, method: &str, params: Value) -> Result<Value>;
}

/// JSON-RPC over HTTP using reqwest
pub struct HttpChainRpc {
    http_client: reqwest::Client,
}

impl HttpChainRpc {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpChainRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcReplyError>,
}

#[derive(Deserialize)]
struct RpcReplyError {
    message: String,
}

#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn call(&self, rpc_url: &str, method: &str, params: Value) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.http_client.post(rpc_url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(ChainError::Rpc {
                method: method.to_string(),
                message: format!("HTTP {}", response.status()),
            }
            .into());
        }

        let reply: RpcReply = response.json().await?;
        if let Some(err) = reply.error {
            return Err(ChainError::Rpc {
                method: method.to_string(),
                message: err.message,
            }
            .into());
        }

        reply.result.ok_or_else(|| {
            ChainError::InvalidResponse {
                method: method.to_string(),
                value: "missing result".to_string(),
            }
            .into()
        })
    }
}

/// Parse a `0x`-prefixed hex quantity
fn parse_quantity(method: &str, value: &Value) -> Result<u128> {
    let invalid = || ChainError::InvalidResponse {
        method: method.to_string(),
        value: value.to_string(),
    };
    let text = value.as_str().ok_or_else(invalid)?;
    let digits = text.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|_| invalid().into())
}

/// Manages connections to ZetaChain and the other supported networks
pub struct ChainConnection {
    config: Arc<Config>,
    rpc: Arc<dyn ChainRpc>,
    /// Reachable chains keyed by name; `None` until the first probe
    clients: RwLock<Option<HashMap<String, ChainConfig>>>,
}

impl ChainConnection {
    pub fn new(config: Arc<Config>, rpc: Arc<dyn ChainRpc>) -> Self {
        Self {
            config,
            rpc,
            clients: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn rpc_call(&self, rpc_url: &str, method: &str, params: Value) -> Result<Value> {
        with_timeout(self.rpc.call(rpc_url, method, params), self.config.timeout_ms).await
    }

    /// Probe every supported chain; reachable ones become available
    pub async fn initialize(&self) {
        let mut clients = self.clients.write().await;
        if clients.is_some() {
            return;
        }

        let mut connected = HashMap::new();
        for chain in &self.config.supported_chains {
            match self.rpc_call(&chain.rpc_url, "eth_chainId", json!([])).await {
                Ok(_) => {
                    info!(chain = %chain.key, rpc_url = %chain.rpc_url, "Connected to chain");
                    connected.insert(chain.key.clone(), chain.clone());
                }
                Err(e) => warn!(chain = %chain.key, error = %e, "Failed to connect to chain"),
            }
        }

        info!(count = connected.len(), "Initialized chain connections");
        *clients = Some(connected);
    }

    /// Connected chain by name (case-insensitive)
    pub async fn get_client(&self, chain_name: &str) -> Option<ChainConfig> {
        if self.clients.read().await.is_none() {
            self.initialize().await;
        }
        self.clients
            .read()
            .await
            .as_ref()
            .and_then(|clients| clients.get(&chain_name.to_lowercase()).cloned())
    }

    async fn require_client(&self, chain_name: &str) -> Result<ChainConfig> {
        self.get_client(chain_name).await.ok_or_else(|| {
            ChainError::Unavailable {
                chain: chain_name.to_string(),
            }
            .into()
        })
    }

    /// Chain id reported by the node
    pub async fn get_chain_id(&self, chain_name: &str) -> Result<u64> {
        let chain = self.require_client(chain_name).await?;
        let value = self.rpc_call(&chain.rpc_url, "eth_chainId", json!([])).await?;
        let id = parse_quantity("eth_chainId", &value)?;
        u64::try_from(id).map_err(|_| {
            ChainError::InvalidResponse {
                method: "eth_chainId".to_string(),
                value: value.to_string(),
            }
            .into()
        })
    }

    /// Latest block number
    pub async fn get_block_number(&self, chain_name: &str) -> Result<u64> {
        let chain = self.require_client(chain_name).await?;
        let value = self.rpc_call(&chain.rpc_url, "eth_blockNumber", json!([])).await?;
        let number = parse_quantity("eth_blockNumber", &value)?;
        u64::try_from(number).map_err(|_| {
            ChainError::InvalidResponse {
                method: "eth_blockNumber".to_string(),
                value: value.to_string(),
            }
            .into()
        })
    }

    /// Balance of `address` in wei
    pub async fn get_balance(&self, address: &str, chain_name: &str) -> Result<u128> {
        let chain = self.require_client(chain_name).await?;
        let value = self
            .rpc_call(&chain.rpc_url, "eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity("eth_getBalance", &value)
    }

    /// Network summary for a chain
    pub async fn get_network_info(&self, chain_name: &str) -> Result<Value> {
        let chain = self.require_client(chain_name).await?;

        let info = async {
            let chain_id = self.get_chain_id(chain_name).await?;
            let block_number = self.get_block_number(chain_name).await?;
            Ok::<_, crate::error::ZetaMcpError>(json!({
                "chain": chain_name,
                "chainId": chain_id,
                "blockNumber": block_number,
                "rpcUrl": chain.rpc_url,
                "explorer": chain.explorer,
                "nativeCurrency": chain.native_currency,
                "name": chain.name,
            }))
        }
        .await;

        if let Err(e) = &info {
            error!(chain = chain_name, error = %e, "Error getting network info");
        }
        info
    }

    /// Forget all connections; the next query probes again
    pub async fn close(&self) {
        *self.clients.write().await = None;
        info!("Closed all ZetaChain connections");
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process RPC backend answering from fixed values
    pub struct MockRpc {
        pub offline: HashSet<String>,
        pub balance_wei: u128,
        pub calls: AtomicUsize,
    }

    impl MockRpc {
        pub fn new() -> Self {
            Self {
                offline: HashSet::new(),
                balance_wei: 1_500_000_000_000_000_000,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainRpc for MockRpc {
        async fn call(&self, rpc_url: &str, method: &str, _params: Value) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.contains(rpc_url) {
                return Err(ChainError::Rpc {
                    method: method.to_string(),
                    message: "connection refused".to_string(),
                }
                .into());
            }
            Ok(match method {
                "eth_chainId" => json!("0x1b59"),
                "eth_blockNumber" => json!("0x10"),
                "eth_getBalance" => json!(format!("0x{:x}", self.balance_wei)),
                _ => Value::Null,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockRpc;
    use super::*;

    fn connection(rpc: MockRpc) -> ChainConnection {
        ChainConnection::new(Arc::new(Config::default()), Arc::new(rpc))
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("m", &json!("0x1b59")).unwrap(), 7001);
        assert_eq!(parse_quantity("m", &json!("0x")).unwrap(), 0);
        assert!(parse_quantity("m", &json!("1b59")).is_err());
        assert!(parse_quantity("m", &json!(12)).is_err());
    }

    #[tokio::test]
    async fn test_network_info() {
        let conn = connection(MockRpc::new());
        let info = conn.get_network_info("zetachain").await.unwrap();
        assert_eq!(info["chainId"], 7001);
        assert_eq!(info["blockNumber"], 16);
        assert_eq!(info["nativeCurrency"], "ZETA");
    }

    #[tokio::test]
    async fn test_offline_chain_is_unavailable() {
        let mut rpc = MockRpc::new();
        rpc.offline
            .insert("https://eth-sepolia.public.blastapi.io".to_string());
        let conn = connection(rpc);
        assert!(conn.get_client("ethereum").await.is_none());
        let err = conn.get_balance("0x0", "ethereum").await.unwrap_err();
        assert_eq!(err.to_string(), "Chain error: Chain ethereum not available");
    }

    #[tokio::test]
    async fn test_unknown_chain() {
        let conn = connection(MockRpc::new());
        assert!(conn.get_network_info("solana").await.is_err());
    }

    #[tokio::test]
    async fn test_balance_and_close() {
        let conn = connection(MockRpc::new());
        let wei = conn.get_balance("0xabc", "ZetaChain").await.unwrap();
        assert_eq!(wei, 1_500_000_000_000_000_000);
        conn.close().await;
        assert!(conn.clients.read().await.is_none());
    }
}
