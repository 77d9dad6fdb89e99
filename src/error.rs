//! Error types for the ZetaChain MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.
//! Protocol-level failures are mapped to JSON-RPC error codes by the dispatcher;
//! everything raised inside a tool handler ends up in the tool envelope instead.

use thiserror::Error;

/// Main error type for the ZetaChain MCP Server
#[derive(Error, Debug)]
pub enum ZetaMcpError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chain connectivity errors
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// Input validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Domain rule violations raised by the collaborators
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// MCP protocol errors
    #[error("{0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar { var: String, value: String },

    #[error("Invalid bind address: {addr}")]
    InvalidBindAddress { addr: String },
}

/// Chain connectivity errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Chain {chain} not available")]
    Unavailable { chain: String },

    #[error("RPC call {method} failed: {message}")]
    Rpc { method: String, message: String },

    #[error("Invalid RPC response for {method}: {value}")]
    InvalidResponse { method: String, value: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid {role} address")]
    InvalidRoleAddress { role: &'static str },

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("Invalid {what}")]
    InvalidAmount { what: &'static str },

    #[error("Invalid vote option")]
    InvalidVote,

    #[error("Invalid transaction hash")]
    InvalidTransactionHash,
}

/// Domain errors raised by the wallet, messaging, governance and DeFi collaborators
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Wallet '{name}' already exists")]
    WalletExists { name: String },

    #[error("Wallet '{name}' not found")]
    WalletNotFound { name: String },

    #[error("Failed to get balance on {chain}")]
    BalanceUnavailable { chain: String },

    #[error("Unsupported chain pair")]
    UnsupportedChainPair,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Proposal not found")]
    ProposalNotFound,

    #[error("Voting period has ended")]
    VotingEnded,

    #[error("Voting period has not started")]
    VotingNotStarted,

    #[error("Pool not found")]
    PoolNotFound,

    #[error("Token {token} is not part of pool {pool_id}")]
    TokenNotInPool { token: String, pool_id: String },

    #[error("Insufficient liquidity in pool {pool_id}")]
    InsufficientLiquidity { pool_id: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Tool '{name}' not found")]
    UnknownTool { name: String },

    #[error("Tool '{name}' registered twice")]
    DuplicateTool { name: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },
}

/// Result type alias for ZetaChain MCP operations
pub type Result<T> = std::result::Result<T, ZetaMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::UnknownTool {
            name: "does_not_exist".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'does_not_exist' not found");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: ZetaMcpError = DomainError::PoolNotFound.into();
        assert_eq!(err.to_string(), "Pool not found");
    }

    #[test]
    fn test_error_conversion() {
        let chain_err = ChainError::Timeout { timeout_ms: 50 };
        let err: ZetaMcpError = chain_err.into();
        assert!(matches!(err, ZetaMcpError::Chain(_)));
        assert!(err.to_string().contains("50ms"));
    }
}
