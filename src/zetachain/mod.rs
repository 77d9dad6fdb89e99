//! ZetaChain collaborators
//!
//! Chain access, wallets and the simulated cross-chain, messaging,
//! governance and DeFi services the tools are bound to.

pub mod connection;
pub mod cross_chain;
pub mod defi;
pub mod governance;
pub mod omnichain;
pub mod timeout;
pub mod validation;
pub mod wallet;

pub use connection::{ChainConnection, ChainRpc, HttpChainRpc};
pub use cross_chain::CrossChainManager;
pub use defi::DefiManager;
pub use governance::GovernanceManager;
pub use omnichain::OmnichainManager;
pub use wallet::WalletManager;

use sha2::{Digest, Sha256};

/// Stable 64-bit value derived from `input`
///
/// Stands in for chain queries the simulated services cannot make, so the same
/// input always yields the same status or voting power.
pub(crate) fn stable_hash(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Current Unix time in seconds
pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
