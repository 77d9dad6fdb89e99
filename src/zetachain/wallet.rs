//! Wallet management
//!
//! Wallets live in memory and are persisted as `wallets.json` under the
//! configured storage directory. Keys are stored in plain text: this is a
//! development wallet, not a secure key store.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha3::{Digest, Keccak256};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::{DomainError, Result, ValidationError, ZetaMcpError};
use crate::zetachain::connection::ChainConnection;
use crate::zetachain::validation::{parse_mnemonic, validate_private_key};

const WALLETS_FILE: &str = "wallets.json";
const ETH_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";
const WEI_PER_ETHER: f64 = 1e18;

/// A stored wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    pub address: String,
    pub private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub chains: Map<String, Value>,
}

/// Derive the EVM address of a secret key
pub fn address_from_secret(secret: &SecretKey) -> String {
    let public = secret.public_key().to_encoded_point(false);
    let hash = Keccak256::digest(&public.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Derive the first Ethereum account key (`m/44'/60'/0'/0/0`) of a mnemonic
fn secret_from_mnemonic(mnemonic: &Mnemonic) -> Result<SecretKey> {
    let seed = mnemonic.to_seed("");
    let path: DerivationPath = ETH_DERIVATION_PATH
        .parse()
        .map_err(|_| ValidationError::InvalidMnemonic)?;
    let xprv = XPrv::derive_from_path(seed, &path).map_err(|_| ValidationError::InvalidMnemonic)?;
    SecretKey::from_slice(&xprv.private_key().to_bytes())
        .map_err(|_| ValidationError::InvalidMnemonic.into())
}

/// A fresh 24-word English mnemonic
fn generate_mnemonic() -> Result<Mnemonic> {
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy);
    Mnemonic::from_entropy(&entropy).map_err(|_| ValidationError::InvalidMnemonic.into())
}

fn secret_from_hex(private_key: &str) -> Result<SecretKey> {
    let hex_key = private_key
        .strip_prefix("0x")
        .or_else(|| private_key.strip_prefix("0X"))
        .unwrap_or(private_key);
    let bytes = hex::decode(hex_key).map_err(|_| ValidationError::InvalidPrivateKey)?;
    SecretKey::from_slice(&bytes).map_err(|_| ValidationError::InvalidPrivateKey.into())
}

fn format_ether(wei: u128) -> String {
    (wei as f64 / WEI_PER_ETHER).to_string()
}

/// Manages wallets across multiple chains
pub struct WalletManager {
    connection: Arc<ChainConnection>,
    storage_path: PathBuf,
    wallets: RwLock<BTreeMap<String, WalletRecord>>,
}

impl WalletManager {
    /// Create a manager, loading any wallets already on disk
    pub fn new(connection: Arc<ChainConnection>) -> Self {
        let storage_path = connection.config().wallet_storage_path.clone();
        let wallets = Self::load_wallets(&storage_path);
        Self {
            connection,
            storage_path,
            wallets: RwLock::new(wallets),
        }
    }

    fn load_wallets(storage_path: &std::path::Path) -> BTreeMap<String, WalletRecord> {
        let file = storage_path.join(WALLETS_FILE);
        if !file.exists() {
            return BTreeMap::new();
        }

        let loaded: Result<BTreeMap<String, WalletRecord>> = std::fs::read_to_string(&file)
            .map_err(ZetaMcpError::from)
            .and_then(|content| Ok(serde_json::from_str(&content)?));

        match loaded {
            Ok(wallets) => {
                info!(count = wallets.len(), "Loaded wallets");
                wallets
            }
            Err(e) => {
                error!(error = %e, "Error loading wallets");
                BTreeMap::new()
            }
        }
    }

    async fn save_wallets(&self, wallets: &BTreeMap<String, WalletRecord>) -> Result<()> {
        tokio::fs::create_dir_all(&self.storage_path).await?;
        let content = serde_json::to_string_pretty(wallets)?;
        tokio::fs::write(self.storage_path.join(WALLETS_FILE), content).await?;
        Ok(())
    }

    async fn insert(&self, record: WalletRecord) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        if wallets.contains_key(&record.name) {
            return Err(DomainError::WalletExists { name: record.name }.into());
        }
        wallets.insert(record.name.clone(), record);
        if let Err(e) = self.save_wallets(&wallets).await {
            error!(error = %e, "Error saving wallets");
        }
        Ok(())
    }

    async fn ensure_absent(&self, name: &str) -> Result<()> {
        if self.wallets.read().await.contains_key(name) {
            return Err(DomainError::WalletExists {
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Create a new wallet from a mnemonic phrase
    ///
    /// Without a phrase a 24-word one is generated and returned.
    pub async fn create_wallet(&self, name: &str, mnemonic: Option<&str>) -> Result<Value> {
        self.ensure_absent(name).await?;

        let mnemonic = match mnemonic {
            Some(phrase) => parse_mnemonic(phrase).ok_or(ValidationError::InvalidMnemonic)?,
            None => generate_mnemonic()?,
        };
        let secret = secret_from_mnemonic(&mnemonic)?;
        let phrase = mnemonic.to_string();

        let address = address_from_secret(&secret);
        let record = WalletRecord {
            name: name.to_string(),
            address: address.clone(),
            private_key: format!("0x{}", hex::encode(secret.to_bytes())),
            mnemonic: Some(phrase.clone()),
            created_at: chrono::Utc::now().timestamp().to_string(),
            chains: Map::new(),
        };
        self.insert(record).await?;

        info!(wallet = name, address = %address, "Created wallet");
        Ok(json!({
            "wallet": {
                "name": name,
                "address": address,
                "mnemonic": phrase,
            }
        }))
    }

    /// Import an existing wallet from a private key
    pub async fn import_wallet(&self, name: &str, private_key: &str) -> Result<Value> {
        self.ensure_absent(name).await?;

        if !validate_private_key(private_key) {
            return Err(ValidationError::InvalidPrivateKey.into());
        }
        let secret = secret_from_hex(private_key)?;
        let address = address_from_secret(&secret);

        let record = WalletRecord {
            name: name.to_string(),
            address: address.clone(),
            private_key: private_key.to_string(),
            mnemonic: None,
            created_at: chrono::Utc::now().timestamp().to_string(),
            chains: Map::new(),
        };
        self.insert(record).await?;

        info!(wallet = name, address = %address, "Imported wallet");
        Ok(json!({
            "wallet": {
                "name": name,
                "address": address,
            }
        }))
    }

    /// List all wallets (without key material)
    pub async fn list_wallets(&self) -> Result<Value> {
        let wallets = self.wallets.read().await;
        let list: Vec<Value> = wallets
            .values()
            .map(|w| {
                json!({
                    "name": w.name,
                    "address": w.address,
                    "created_at": w.created_at,
                })
            })
            .collect();

        Ok(json!({ "wallets": list, "count": list.len() }))
    }

    async fn address_of(&self, wallet_name: &str) -> Result<(String, String)> {
        let wallet = self
            .get_wallet_by_name(wallet_name)
            .await
            .ok_or_else(|| DomainError::WalletNotFound {
                name: wallet_name.to_string(),
            })?;
        Ok((wallet.address, wallet.created_at))
    }

    /// Balance of a wallet on one chain
    pub async fn get_balance(&self, wallet_name: &str, chain: &str) -> Result<Value> {
        let (address, _) = self.address_of(wallet_name).await?;

        let wei = self
            .connection
            .get_balance(&address, chain)
            .await
            .map_err(|e| {
                error!(wallet = wallet_name, chain, error = %e, "Error getting balance");
                DomainError::BalanceUnavailable {
                    chain: chain.to_string(),
                }
            })?;

        Ok(json!({
            "balance": {
                "address": address,
                "chain": chain,
                "wei": wei.to_string(),
                "eth": format_ether(wei),
            }
        }))
    }

    /// Wallet details with balances on every reachable chain
    pub async fn get_wallet_info(&self, wallet_name: &str) -> Result<Value> {
        let (address, created_at) = self.address_of(wallet_name).await?;

        let mut balances = Map::new();
        for chain in &self.connection.config().supported_chains {
            if let Ok(wei) = self.connection.get_balance(&address, &chain.key).await {
                balances.insert(
                    chain.key.clone(),
                    json!({ "wei": wei.to_string(), "eth": format_ether(wei) }),
                );
            }
        }

        Ok(json!({
            "wallet": {
                "name": wallet_name,
                "address": address,
                "created_at": created_at,
                "balances": balances,
            }
        }))
    }

    /// Stored record for a wallet
    pub async fn get_wallet_by_name(&self, name: &str) -> Option<WalletRecord> {
        self.wallets.read().await.get(name).cloned()
    }
}
