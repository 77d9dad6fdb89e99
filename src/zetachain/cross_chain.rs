//! Cross-chain operations through the ZetaChain gateway
//!
//! Bridge data, fees and transaction status are simulated; only the chain
//! table and gateway address come from configuration.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{DomainError, Result, ValidationError};
use crate::zetachain::validation::{parse_amount, validate_address, validate_transaction_hash};
use crate::zetachain::{now_secs, stable_hash};

const BASE_FEE: f64 = 0.001;
const PERCENTAGE_FEE: f64 = 0.001;
const ESTIMATED_TIME: &str = "5-10 minutes";
const TX_STATUSES: [&str; 3] = ["pending", "confirmed", "failed"];
const MAX_HISTORY: usize = 5;

fn explorer_tx_url(tx_hash: &str) -> String {
    format!("https://explorer.zetachain.com/tx/{}", tx_hash)
}

/// Manages cross-chain transfers
pub struct CrossChainManager {
    config: Arc<Config>,
}

impl CrossChainManager {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Chains available for cross-chain operations
    pub async fn get_supported_chains(&self) -> Result<Value> {
        let chains: Vec<Value> = self
            .config
            .supported_chains
            .iter()
            .map(|c| {
                json!({
                    "name": c.key,
                    "displayName": c.name,
                    "chainId": c.chain_id,
                    "nativeCurrency": c.native_currency,
                    "explorer": c.explorer,
                })
            })
            .collect();

        Ok(json!({ "chains": chains, "count": chains.len() }))
    }

    /// Bridge details between two chains
    pub async fn get_bridge_info(&self, from_chain: &str, to_chain: &str) -> Result<Value> {
        let (from, to) = match (self.config.chain(from_chain), self.config.chain(to_chain)) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(DomainError::UnsupportedChainPair.into()),
        };

        Ok(json!({
            "bridgeInfo": {
                "fromChain": {
                    "name": from_chain,
                    "chainId": from.chain_id,
                    "nativeCurrency": from.native_currency,
                },
                "toChain": {
                    "name": to_chain,
                    "chainId": to.chain_id,
                    "nativeCurrency": to.native_currency,
                },
                "bridgeAddress": self.config.gateway_address,
                "estimatedTime": ESTIMATED_TIME,
                "fees": {
                    "gas": "0.001 ZETA",
                    "bridge": "0.0001 ZETA",
                },
                "supportedTokens": ["native", "USDC", "USDT", "WETH"],
            }
        }))
    }

    /// Fee estimate: a flat base fee plus 0.1% of the amount
    pub async fn estimate_cross_chain_fee(
        &self,
        from_chain: &str,
        to_chain: &str,
        amount: &str,
    ) -> Result<Value> {
        let amount = parse_amount(amount).ok_or(ValidationError::InvalidAmount { what: "amount" })?;
        debug!(from_chain, to_chain, amount, "Estimating cross-chain fee");

        let percentage_fee = amount * PERCENTAGE_FEE;
        let total_fee = BASE_FEE + percentage_fee;

        Ok(json!({
            "fees": {
                "baseFee": BASE_FEE.to_string(),
                "percentageFee": percentage_fee.to_string(),
                "totalFee": total_fee.to_string(),
                "currency": "ZETA",
                "estimatedTime": ESTIMATED_TIME,
            }
        }))
    }

    /// Status of a cross-chain transaction
    pub async fn get_cross_chain_status(&self, tx_hash: &str) -> Result<Value> {
        if !validate_transaction_hash(tx_hash) {
            return Err(ValidationError::InvalidTransactionHash.into());
        }
        let hash = stable_hash(tx_hash);
        let status = TX_STATUSES[(hash % TX_STATUSES.len() as u64) as usize];
        let confirmations = if status == "confirmed" {
            1 + (hash >> 8) % 12
        } else {
            0
        };

        Ok(json!({
            "status": {
                "txHash": tx_hash,
                "status": status,
                "confirmations": confirmations,
                "timestamp": now_secs(),
                "explorerUrl": explorer_tx_url(tx_hash),
            }
        }))
    }

    /// Recent cross-chain transfers of an address
    pub async fn get_cross_chain_history(&self, address: &str, limit: usize) -> Result<Value> {
        if !validate_address(address) {
            return Err(ValidationError::InvalidAddress.into());
        }

        let now = now_secs();
        let tx_hash = format!("0x{}", "0".repeat(64));
        let history: Vec<Value> = (0..limit.min(MAX_HISTORY))
            .map(|i| {
                json!({
                    "txHash": tx_hash,
                    "fromChain": "ethereum",
                    "toChain": "zetachain",
                    "amount": "1.0",
                    "token": "ETH",
                    "status": "confirmed",
                    "timestamp": now - (i as i64) * 3600,
                    "explorerUrl": explorer_tx_url(&tx_hash),
                })
            })
            .collect();

        Ok(json!({ "history": history, "count": history.len() }))
    }
}
