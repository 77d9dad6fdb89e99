//! ZetaChain MCP Server Library
//!
//! A Model Context Protocol (MCP) server for ZetaChain.
//! Provides tools for wallets, cross-chain transfers, omnichain messaging,
//! governance and DeFi over stdio or HTTP.

pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod zetachain;

pub use config::Config;
pub use error::{Result, ZetaMcpError};
