//! Omnichain messaging through ZetaChain
//!
//! Messages are kept in memory for the lifetime of the process.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{DomainError, Result, ValidationError};
use crate::zetachain::connection::ChainConnection;
use crate::zetachain::validation::validate_address;
use crate::zetachain::{now_secs, stable_hash};

const MESSAGE_STATUSES: [&str; 4] = ["pending", "confirmed", "delivered", "failed"];

/// A message sent between two chains
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OmnichainMessage {
    pub id: String,
    pub from_chain: String,
    pub to_chain: String,
    pub message: String,
    pub sender_address: String,
    pub recipient_address: String,
    pub timestamp: i64,
    pub status: String,
}

impl OmnichainMessage {
    fn involves(&self, address: &str) -> bool {
        self.sender_address.eq_ignore_ascii_case(address)
            || self.recipient_address.eq_ignore_ascii_case(address)
    }
}

/// Manages omnichain messaging
pub struct OmnichainManager {
    connection: Arc<ChainConnection>,
    /// Messages in send order
    messages: Mutex<Vec<OmnichainMessage>>,
}

impl OmnichainManager {
    pub fn new(connection: Arc<ChainConnection>) -> Self {
        Self {
            connection,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Record a new outgoing message
    pub async fn send_omnichain_message(
        &self,
        from_chain: &str,
        to_chain: &str,
        message: &str,
        sender_address: &str,
        recipient_address: &str,
    ) -> Result<Value> {
        if !validate_address(sender_address) || !validate_address(recipient_address) {
            return Err(ValidationError::InvalidAddress.into());
        }

        let timestamp = now_secs();
        let digest = Sha256::digest(
            format!(
                "{}{}{}{}{}{}",
                from_chain, to_chain, message, sender_address, recipient_address, timestamp
            )
            .as_bytes(),
        );
        let id = hex::encode(digest)[..16].to_string();

        let record = OmnichainMessage {
            id: id.clone(),
            from_chain: from_chain.to_string(),
            to_chain: to_chain.to_string(),
            message: message.to_string(),
            sender_address: sender_address.to_string(),
            recipient_address: recipient_address.to_string(),
            timestamp,
            status: "pending".to_string(),
        };

        {
            let mut messages = self.messages.lock().await;
            messages.retain(|m| m.id != id);
            messages.push(record);
        }

        info!(message_id = %id, from_chain, to_chain, "Sent omnichain message");
        Ok(json!({
            "messageId": id,
            "status": "pending",
            "estimatedDelivery": "5-10 minutes",
        }))
    }

    /// Current status of a message
    pub async fn get_message_status(&self, message_id: &str) -> Result<Value> {
        let mut messages = self.messages.lock().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(DomainError::MessageNotFound)?;

        let index = stable_hash(message_id) % MESSAGE_STATUSES.len() as u64;
        message.status = MESSAGE_STATUSES[index as usize].to_string();

        Ok(json!({ "message": message }))
    }

    /// Messages sent or received by an address, newest first
    pub async fn get_messages(&self, address: &str, limit: usize) -> Result<Value> {
        if !validate_address(address) {
            return Err(ValidationError::InvalidAddress.into());
        }

        let messages = self.messages.lock().await;
        let mut matching: Vec<&OmnichainMessage> =
            messages.iter().rev().filter(|m| m.involves(address)).collect();
        // Stable sort keeps later sends first within the same second
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);

        Ok(json!({ "messages": matching, "count": matching.len() }))
    }

    /// Aggregate message counts
    pub async fn get_omnichain_stats(&self) -> Result<Value> {
        let messages = self.messages.lock().await;

        let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
        let mut addresses = HashSet::new();
        for m in messages.iter() {
            *by_status.entry(m.status.as_str()).or_default() += 1;
            addresses.insert(m.sender_address.as_str());
            addresses.insert(m.recipient_address.as_str());
        }
        let count = |status: &str| by_status.get(status).copied().unwrap_or(0);

        let total = messages.len();
        let delivered = count("delivered");
        let success_rate = delivered as f64 / total.max(1) as f64 * 100.0;

        Ok(json!({
            "stats": {
                "totalMessages": total,
                "pendingMessages": count("pending"),
                "confirmedMessages": count("confirmed"),
                "deliveredMessages": delivered,
                "failedMessages": count("failed"),
                "uniqueAddresses": addresses.len(),
                "successRate": format!("{:.1}%", success_rate),
            }
        }))
    }

    /// Online/offline state of every configured chain
    pub async fn get_chain_status(&self) -> Result<Value> {
        let mut chains = serde_json::Map::new();

        for chain in &self.connection.config().supported_chains {
            let status = match self.connection.get_network_info(&chain.key).await {
                Ok(info) => json!({
                    "status": "online",
                    "blockNumber": info["blockNumber"],
                    "chainId": info["chainId"],
                    "lastUpdate": now_secs(),
                }),
                Err(e) => json!({
                    "status": "offline",
                    "error": e.to_string(),
                    "lastUpdate": now_secs(),
                }),
            };
            chains.insert(chain.key.clone(), status);
        }

        Ok(json!({ "chains": chains }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::zetachain::connection::mock::MockRpc;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";
    const CAROL: &str = "0x3333333333333333333333333333333333333333";

    fn manager_with(rpc: MockRpc) -> OmnichainManager {
        let connection = ChainConnection::new(Arc::new(Config::default()), Arc::new(rpc));
        OmnichainManager::new(Arc::new(connection))
    }

    fn manager() -> OmnichainManager {
        manager_with(MockRpc::new())
    }

    #[tokio::test]
    async fn test_send_and_status() {
        let omni = manager();
        let sent = omni
            .send_omnichain_message("ethereum", "zetachain", "hello", ALICE, BOB)
            .await
            .unwrap();
        let id = sent["messageId"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 16);
        assert_eq!(sent["status"], "pending");

        let status = omni.get_message_status(&id).await.unwrap();
        let value = status["message"]["status"].as_str().unwrap();
        assert!(MESSAGE_STATUSES.contains(&value));
        assert_eq!(status["message"]["senderAddress"], ALICE);

        let err = omni.get_message_status("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Message not found");
    }

    #[tokio::test]
    async fn test_invalid_addresses() {
        let omni = manager();
        let err = omni
            .send_omnichain_message("ethereum", "zetachain", "hi", "0x12", BOB)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid address");
        assert!(omni.get_messages("nope", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_messages_filter_and_order() {
        let omni = manager();
        omni.send_omnichain_message("ethereum", "zetachain", "one", ALICE, BOB)
            .await
            .unwrap();
        omni.send_omnichain_message("bsc", "zetachain", "two", CAROL, ALICE)
            .await
            .unwrap();
        omni.send_omnichain_message("bsc", "polygon", "three", BOB, CAROL)
            .await
            .unwrap();

        let result = omni.get_messages(ALICE, 10).await.unwrap();
        assert_eq!(result["count"], 2);
        assert_eq!(result["messages"][0]["message"], "two");

        let limited = omni.get_messages(ALICE, 1).await.unwrap();
        assert_eq!(limited["count"], 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let omni = manager();
        let empty = omni.get_omnichain_stats().await.unwrap();
        assert_eq!(empty["stats"]["successRate"], "0.0%");

        omni.send_omnichain_message("ethereum", "zetachain", "one", ALICE, BOB)
            .await
            .unwrap();
        let stats = omni.get_omnichain_stats().await.unwrap();
        assert_eq!(stats["stats"]["totalMessages"], 1);
        assert_eq!(stats["stats"]["pendingMessages"], 1);
        assert_eq!(stats["stats"]["uniqueAddresses"], 2);
    }

    #[tokio::test]
    async fn test_chain_status() {
        let mut rpc = MockRpc::new();
        rpc.offline.insert("https://data-seed-prebsc-1-s1.binance.org:8545".to_string());
        let omni = manager_with(rpc);

        let result = omni.get_chain_status().await.unwrap();
        assert_eq!(result["chains"]["zetachain"]["status"], "online");
        assert_eq!(result["chains"]["zetachain"]["blockNumber"], 16);
        assert_eq!(result["chains"]["bsc"]["status"], "offline");
        assert_eq!(result["chains"].as_object().unwrap().len(), 7);
    }
}
