//! Configuration management for the ZetaChain MCP Server
//!
//! Defaults are embedded, then overridden by environment variables, then by
//! command-line flags applied in `main`.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{ConfigError, Result};

/// Default ZetaChain Athens RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://zetachain-athens-evm.blockpi.network/v1/rpc/public";

/// Default gateway contract address
pub const DEFAULT_GATEWAY_ADDRESS: &str = "0x6c533f7fe93fae114d0954697069df33c9b74fd7";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Chain used when a tool does not name one
pub const DEFAULT_CHAIN: &str = "zetachain";

/// Static description of one supported chain
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Lookup key (lowercase)
    pub key: String,

    /// Human readable network name
    pub name: String,

    /// EVM chain id
    pub chain_id: u64,

    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Block explorer base URL
    pub explorer: String,

    /// Native currency symbol
    pub native_currency: String,
}

impl ChainConfig {
    fn new(key: &str, name: &str, chain_id: u64, rpc_url: &str, explorer: &str, currency: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            chain_id,
            rpc_url: rpc_url.to_string(),
            explorer: explorer.to_string(),
            native_currency: currency.to_string(),
        }
    }
}

/// Configuration for the ZetaChain MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Network name (athens, mainnet, localhost)
    pub network: String,

    /// Primary ZetaChain RPC URL
    pub rpc_url: String,

    /// Cross-chain gateway contract address
    pub gateway_address: String,

    /// Timeout applied to remote calls, in milliseconds
    pub timeout_ms: u64,

    /// Directory holding `wallets.json`
    pub wallet_storage_path: PathBuf,

    /// HTTP bind host
    pub http_host: String,

    /// HTTP bind port
    pub http_port: u16,

    /// Supported chains, in display order
    pub supported_chains: Vec<ChainConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: "athens".to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            gateway_address: DEFAULT_GATEWAY_ADDRESS.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            wallet_storage_path: PathBuf::from("./data/wallets"),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            supported_chains: default_chains(),
        }
    }
}

impl Config {
    /// Create a configuration from defaults and environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(network) = std::env::var("ZETACHAIN_NETWORK") {
            config.network = network;
        }
        if let Ok(rpc_url) = std::env::var("ZETACHAIN_RPC_URL") {
            config.set_rpc_url(rpc_url);
        }
        if let Ok(gateway) = std::env::var("ZETACHAIN_GATEWAY") {
            config.gateway_address = gateway;
        }
        if let Some(timeout) = parse_env::<u64>("ZETACHAIN_TIMEOUT")? {
            config.timeout_ms = timeout;
        }
        if let Ok(path) = std::env::var("ZETACHAIN_WALLET_PATH") {
            config.wallet_storage_path = PathBuf::from(path);
        }
        if let Ok(host) = std::env::var("ZETACHAIN_HTTP_HOST") {
            config.http_host = host;
        }
        if let Some(port) = parse_env::<u16>("ZETACHAIN_HTTP_PORT")? {
            config.http_port = port;
        }

        Ok(config)
    }

    /// Override the primary RPC URL, keeping the zetachain entry in sync
    pub fn set_rpc_url(&mut self, rpc_url: impl Into<String>) {
        self.rpc_url = rpc_url.into();
        if let Some(chain) = self
            .supported_chains
            .iter_mut()
            .find(|c| c.key == DEFAULT_CHAIN)
        {
            chain.rpc_url = self.rpc_url.clone();
        }
    }

    /// Get configuration for a specific chain (case-insensitive)
    pub fn chain(&self, chain_name: &str) -> Option<&ChainConfig> {
        let key = chain_name.to_lowercase();
        self.supported_chains.iter().find(|c| c.key == key)
    }

    /// Socket address for the HTTP transport
    pub fn bind_socket(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.http_host, self.http_port);
        addr.parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddress { addr }.into())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| {
                ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    value,
                }
                .into()
            }),
        Err(_) => Ok(None),
    }
}

fn default_chains() -> Vec<ChainConfig> {
    vec![
        ChainConfig::new(
            "zetachain",
            "ZetaChain Athens Testnet",
            7001,
            DEFAULT_RPC_URL,
            "https://explorer.zetachain.com",
            "ZETA",
        ),
        ChainConfig::new(
            "ethereum",
            "Ethereum Sepolia",
            11_155_111,
            "https://eth-sepolia.public.blastapi.io",
            "https://sepolia.etherscan.io",
            "ETH",
        ),
        ChainConfig::new(
            "bsc",
            "BSC Testnet",
            97,
            "https://data-seed-prebsc-1-s1.binance.org:8545",
            "https://testnet.bscscan.com",
            "BNB",
        ),
        ChainConfig::new(
            "polygon",
            "Polygon Mumbai",
            80_001,
            "https://rpc.ankr.com/polygon_mumbai",
            "https://mumbai.polygonscan.com",
            "MATIC",
        ),
        ChainConfig::new(
            "avalanche",
            "Avalanche Fuji",
            43_113,
            "https://api.avax-test.network/ext/bc/C/rpc",
            "https://testnet.snowtrace.io",
            "AVAX",
        ),
        ChainConfig::new(
            "optimism",
            "Optimism Goerli",
            420,
            "https://goerli.optimism.io",
            "https://goerli-optimism.etherscan.io",
            "ETH",
        ),
        ChainConfig::new(
            "arbitrum",
            "Arbitrum Goerli",
            421_613,
            "https://goerli-rollup.arbitrum.io/rpc",
            "https://goerli.arbiscan.io",
            "ETH",
        ),
    ]
}
