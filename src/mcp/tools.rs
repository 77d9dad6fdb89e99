//! MCP Tool definitions and handlers
//!
//! Binds the ZetaChain collaborators to the 28 tools exposed over MCP.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::{Config, DEFAULT_CHAIN};
use crate::error::Result;
use crate::mcp::registry::{handler, parse_args, ToolCatalog, ToolHandler, ToolRegistry};
use crate::mcp::types::Tool;
use crate::zetachain::{
    ChainConnection, ChainRpc, CrossChainManager, DefiManager, GovernanceManager,
    OmnichainManager, WalletManager,
};

const DEFAULT_LIMIT: usize = 10;

fn default_chain() -> String {
    DEFAULT_CHAIN.to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Bind a collaborator method to a handler taking typed arguments
fn bind<S, A, F, Fut>(service: &Arc<S>, f: F) -> ToolHandler
where
    S: Send + Sync + 'static,
    A: DeserializeOwned + Send + 'static,
    F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    let service = Arc::clone(service);
    handler(move |args| {
        let call = parse_args::<A>(args).map(|args| f(Arc::clone(&service), args));
        async move { call?.await }
    })
}

// ==================== Tool Arguments ====================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateWalletArgs {
    name: String,
    #[serde(default)]
    mnemonic: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportWalletArgs {
    name: String,
    private_key: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GetBalanceArgs {
    wallet_name: String,
    #[serde(default = "default_chain")]
    chain: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WalletNameArgs {
    wallet_name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainPairArgs {
    from_chain: String,
    to_chain: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FeeArgs {
    from_chain: String,
    to_chain: String,
    amount: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TxHashArgs {
    tx_hash: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddressLimitArgs {
    address: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SendMessageArgs {
    from_chain: String,
    to_chain: String,
    message: String,
    sender_address: String,
    recipient_address: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageIdArgs {
    message_id: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProposalsArgs {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProposalIdArgs {
    proposal_id: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VoteArgs {
    proposal_id: String,
    voter_address: String,
    vote: String,
    voting_power: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddressArgs {
    address: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PoolIdArgs {
    pool_id: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddLiquidityArgs {
    pool_id: String,
    token_a_amount: String,
    token_b_amount: String,
    user_address: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoveLiquidityArgs {
    pool_id: String,
    lp_tokens: String,
    user_address: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SwapArgs {
    pool_id: String,
    token_in: String,
    amount_in: String,
    user_address: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UserAddressArgs {
    user_address: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainArgs {
    #[serde(default = "default_chain")]
    chain: String,
}

// ==================== Catalog ====================

/// The ZetaChain tool set and the collaborators behind it
pub struct ZetaChainTools {
    connection: Arc<ChainConnection>,
    wallets: Arc<WalletManager>,
    cross_chain: Arc<CrossChainManager>,
    omnichain: Arc<OmnichainManager>,
    governance: Arc<GovernanceManager>,
    defi: Arc<DefiManager>,
}

impl ZetaChainTools {
    /// Build the collaborators over the given RPC backend
    pub fn new(config: Arc<Config>, rpc: Arc<dyn ChainRpc>) -> Self {
        let connection = Arc::new(ChainConnection::new(Arc::clone(&config), rpc));
        Self {
            wallets: Arc::new(WalletManager::new(Arc::clone(&connection))),
            cross_chain: Arc::new(CrossChainManager::new(config)),
            omnichain: Arc::new(OmnichainManager::new(Arc::clone(&connection))),
            governance: Arc::new(GovernanceManager::new()),
            defi: Arc::new(DefiManager::new()),
            connection,
        }
    }

    /// Collaborators talking to the configured HTTP endpoints
    pub fn http(config: Arc<Config>) -> Self {
        Self::new(config, Arc::new(crate::zetachain::HttpChainRpc::new()))
    }

    fn register_wallet_tools(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(
            Tool::new("create_wallet", "Create a new ZetaChain wallet", create_wallet_schema()),
            bind(&self.wallets, |w, a: CreateWalletArgs| async move {
                w.create_wallet(&a.name, a.mnemonic.as_deref()).await
            }),
        )?;
        registry.register(
            Tool::new(
                "import_wallet",
                "Import an existing wallet from private key",
                import_wallet_schema(),
            ),
            bind(&self.wallets, |w, a: ImportWalletArgs| async move {
                w.import_wallet(&a.name, &a.private_key).await
            }),
        )?;
        registry.register(
            Tool::new("list_wallets", "List all created/imported wallets", empty_schema()),
            bind(&self.wallets, |w, _: NoArgs| async move { w.list_wallets().await }),
        )?;
        registry.register(
            Tool::new(
                "get_balance",
                "Get balance for a wallet on a specific chain",
                get_balance_schema(),
            ),
            bind(&self.wallets, |w, a: GetBalanceArgs| async move {
                w.get_balance(&a.wallet_name, &a.chain).await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_wallet_info",
                "Get detailed information about a wallet",
                wallet_name_schema(),
            ),
            bind(&self.wallets, |w, a: WalletNameArgs| async move {
                w.get_wallet_info(&a.wallet_name).await
            }),
        )?;
        Ok(())
    }

    fn register_cross_chain_tools(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(
            Tool::new(
                "get_supported_chains",
                "Get list of supported chains for cross-chain operations",
                empty_schema(),
            ),
            bind(&self.cross_chain, |c, _: NoArgs| async move {
                c.get_supported_chains().await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_bridge_info",
                "Get bridge information between two chains",
                chain_pair_schema(),
            ),
            bind(&self.cross_chain, |c, a: ChainPairArgs| async move {
                c.get_bridge_info(&a.from_chain, &a.to_chain).await
            }),
        )?;
        registry.register(
            Tool::new(
                "estimate_cross_chain_fee",
                "Estimate fees for cross-chain transfer",
                fee_schema(),
            ),
            bind(&self.cross_chain, |c, a: FeeArgs| async move {
                c.estimate_cross_chain_fee(&a.from_chain, &a.to_chain, &a.amount)
                    .await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_cross_chain_status",
                "Get status of a cross-chain transaction",
                object_schema(&[("tx_hash", "string", "Transaction hash")], &["tx_hash"]),
            ),
            bind(&self.cross_chain, |c, a: TxHashArgs| async move {
                c.get_cross_chain_status(&a.tx_hash).await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_cross_chain_history",
                "Get cross-chain transaction history for an address",
                address_limit_schema("Number of transactions to return"),
            ),
            bind(&self.cross_chain, |c, a: AddressLimitArgs| async move {
                c.get_cross_chain_history(&a.address, a.limit).await
            }),
        )?;
        Ok(())
    }

    fn register_omnichain_tools(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(
            Tool::new(
                "send_omnichain_message",
                "Send an omnichain message",
                send_message_schema(),
            ),
            bind(&self.omnichain, |o, a: SendMessageArgs| async move {
                o.send_omnichain_message(
                    &a.from_chain,
                    &a.to_chain,
                    &a.message,
                    &a.sender_address,
                    &a.recipient_address,
                )
                .await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_message_status",
                "Get status of an omnichain message",
                object_schema(&[("message_id", "string", "Message ID")], &["message_id"]),
            ),
            bind(&self.omnichain, |o, a: MessageIdArgs| async move {
                o.get_message_status(&a.message_id).await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_messages",
                "Get omnichain messages for an address",
                address_limit_schema("Number of messages to return"),
            ),
            bind(&self.omnichain, |o, a: AddressLimitArgs| async move {
                o.get_messages(&a.address, a.limit).await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_omnichain_stats",
                "Get omnichain messaging statistics",
                empty_schema(),
            ),
            bind(&self.omnichain, |o, _: NoArgs| async move {
                o.get_omnichain_stats().await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_chain_status",
                "Get status of all supported chains",
                empty_schema(),
            ),
            bind(&self.omnichain, |o, _: NoArgs| async move { o.get_chain_status().await }),
        )?;
        Ok(())
    }

    fn register_governance_tools(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(
            Tool::new(
                "get_proposals",
                "Get governance proposals",
                object_schema(
                    &[("status", "string", "Filter by status (voting, passed, failed)")],
                    &[],
                ),
            ),
            bind(&self.governance, |g, a: ProposalsArgs| async move {
                g.get_proposals(a.status.as_deref()).await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_proposal",
                "Get details of a specific proposal",
                object_schema(&[("proposal_id", "string", "Proposal ID")], &["proposal_id"]),
            ),
            bind(&self.governance, |g, a: ProposalIdArgs| async move {
                g.get_proposal(&a.proposal_id).await
            }),
        )?;
        registry.register(
            Tool::new(
                "vote_on_proposal",
                "Vote on a governance proposal",
                vote_schema(),
            ),
            bind(&self.governance, |g, a: VoteArgs| async move {
                g.vote_on_proposal(&a.proposal_id, &a.voter_address, &a.vote, a.voting_power)
                    .await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_voting_power",
                "Get voting power for an address",
                object_schema(&[("address", "string", "Wallet address")], &["address"]),
            ),
            bind(&self.governance, |g, a: AddressArgs| async move {
                g.get_voting_power(&a.address).await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_governance_stats",
                "Get governance statistics",
                empty_schema(),
            ),
            bind(&self.governance, |g, _: NoArgs| async move {
                g.get_governance_stats().await
            }),
        )?;
        Ok(())
    }

    fn register_defi_tools(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(
            Tool::new("get_pools", "Get available liquidity pools", empty_schema()),
            bind(&self.defi, |d, _: NoArgs| async move { d.get_pools().await }),
        )?;
        registry.register(
            Tool::new(
                "get_pool_info",
                "Get detailed information about a specific pool",
                object_schema(&[("pool_id", "string", "Pool ID")], &["pool_id"]),
            ),
            bind(&self.defi, |d, a: PoolIdArgs| async move {
                d.get_pool_info(&a.pool_id).await
            }),
        )?;
        registry.register(
            Tool::new("add_liquidity", "Add liquidity to a pool", add_liquidity_schema()),
            bind(&self.defi, |d, a: AddLiquidityArgs| async move {
                d.add_liquidity(&a.pool_id, &a.token_a_amount, &a.token_b_amount, &a.user_address)
                    .await
            }),
        )?;
        registry.register(
            Tool::new(
                "remove_liquidity",
                "Remove liquidity from a pool",
                remove_liquidity_schema(),
            ),
            bind(&self.defi, |d, a: RemoveLiquidityArgs| async move {
                d.remove_liquidity(&a.pool_id, &a.lp_tokens, &a.user_address)
                    .await
            }),
        )?;
        registry.register(
            Tool::new("swap_tokens", "Swap tokens in a pool", swap_schema()),
            bind(&self.defi, |d, a: SwapArgs| async move {
                d.swap_tokens(&a.pool_id, &a.token_in, &a.amount_in, &a.user_address)
                    .await
            }),
        )?;
        registry.register(
            Tool::new(
                "get_user_positions",
                "Get user's liquidity positions",
                object_schema(&[("user_address", "string", "User address")], &["user_address"]),
            ),
            bind(&self.defi, |d, a: UserAddressArgs| async move {
                d.get_user_positions(&a.user_address).await
            }),
        )?;
        registry.register(
            Tool::new("get_defi_stats", "Get DeFi platform statistics", empty_schema()),
            bind(&self.defi, |d, _: NoArgs| async move { d.get_defi_stats().await }),
        )?;
        Ok(())
    }

    fn register_network_tools(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(
            Tool::new(
                "get_network_info",
                "Get network information for a specific chain",
                object_schema(&[("chain", "string", "Chain name (default: zetachain)")], &[]),
            ),
            bind(&self.connection, |c, a: ChainArgs| async move {
                c.get_network_info(&a.chain).await
            }),
        )?;
        Ok(())
    }
}

#[async_trait]
impl ToolCatalog for ZetaChainTools {
    async fn load(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        self.register_wallet_tools(&mut registry)?;
        self.register_cross_chain_tools(&mut registry)?;
        self.register_omnichain_tools(&mut registry)?;
        self.register_governance_tools(&mut registry)?;
        self.register_defi_tools(&mut registry)?;
        self.register_network_tools(&mut registry)?;

        info!(count = registry.len(), "Loaded ZetaChain tools");
        Ok(registry)
    }

    async fn shutdown(&self) {
        self.connection.close().await;
    }
}

// ==================== Schema Definitions ====================

fn object_schema(properties: &[(&str, &str, &str)], required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, kind, description)| {
            (
                name.to_string(),
                json!({ "type": kind, "description": description }),
            )
        })
        .collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn empty_schema() -> Value {
    object_schema(&[], &[])
}

fn create_wallet_schema() -> Value {
    object_schema(
        &[
            ("name", "string", "Name for the wallet"),
            ("mnemonic", "string", "Optional mnemonic phrase"),
        ],
        &["name"],
    )
}

fn import_wallet_schema() -> Value {
    object_schema(
        &[
            ("name", "string", "Name for the wallet"),
            ("private_key", "string", "Private key in hex format"),
        ],
        &["name", "private_key"],
    )
}

fn get_balance_schema() -> Value {
    object_schema(
        &[
            ("wallet_name", "string", "Name of the wallet"),
            ("chain", "string", "Chain name (default: zetachain)"),
        ],
        &["wallet_name"],
    )
}

fn wallet_name_schema() -> Value {
    object_schema(&[("wallet_name", "string", "Name of the wallet")], &["wallet_name"])
}

fn chain_pair_schema() -> Value {
    object_schema(
        &[
            ("from_chain", "string", "Source chain"),
            ("to_chain", "string", "Destination chain"),
        ],
        &["from_chain", "to_chain"],
    )
}

fn fee_schema() -> Value {
    object_schema(
        &[
            ("from_chain", "string", "Source chain"),
            ("to_chain", "string", "Destination chain"),
            ("amount", "string", "Amount to transfer"),
        ],
        &["from_chain", "to_chain", "amount"],
    )
}

fn address_limit_schema(limit_description: &str) -> Value {
    object_schema(
        &[
            ("address", "string", "Wallet address"),
            ("limit", "integer", limit_description),
        ],
        &["address"],
    )
}

fn send_message_schema() -> Value {
    object_schema(
        &[
            ("from_chain", "string", "Source chain"),
            ("to_chain", "string", "Destination chain"),
            ("message", "string", "Message content"),
            ("sender_address", "string", "Sender address"),
            ("recipient_address", "string", "Recipient address"),
        ],
        &[
            "from_chain",
            "to_chain",
            "message",
            "sender_address",
            "recipient_address",
        ],
    )
}

fn vote_schema() -> Value {
    let mut schema = object_schema(
        &[
            ("proposal_id", "string", "Proposal ID"),
            ("voter_address", "string", "Voter address"),
            ("vote", "string", "Vote option"),
            ("voting_power", "integer", "Voting power"),
        ],
        &["proposal_id", "voter_address", "vote", "voting_power"],
    );
    schema["properties"]["vote"]["enum"] = json!(["yes", "no", "abstain"]);
    schema
}

fn add_liquidity_schema() -> Value {
    object_schema(
        &[
            ("pool_id", "string", "Pool ID"),
            ("token_a_amount", "string", "Amount of token A"),
            ("token_b_amount", "string", "Amount of token B"),
            ("user_address", "string", "User address"),
        ],
        &["pool_id", "token_a_amount", "token_b_amount", "user_address"],
    )
}

fn remove_liquidity_schema() -> Value {
    object_schema(
        &[
            ("pool_id", "string", "Pool ID"),
            ("lp_tokens", "string", "Amount of LP tokens to remove"),
            ("user_address", "string", "User address"),
        ],
        &["pool_id", "lp_tokens", "user_address"],
    )
}

fn swap_schema() -> Value {
    object_schema(
        &[
            ("pool_id", "string", "Pool ID"),
            ("token_in", "string", "Input token"),
            ("amount_in", "string", "Input amount"),
            ("user_address", "string", "User address"),
        ],
        &["pool_id", "token_in", "amount_in", "user_address"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zetachain::connection::mock::MockRpc;

    fn tools(dir: &std::path::Path) -> ZetaChainTools {
        let config = Config {
            wallet_storage_path: dir.to_path_buf(),
            ..Config::default()
        };
        ZetaChainTools::new(Arc::new(config), Arc::new(MockRpc::new()))
    }

    #[tokio::test]
    async fn test_catalog_has_all_tools() {
        let dir = tempfile::tempdir().unwrap();
        let registry = tools(dir.path()).load().await.unwrap();
        assert_eq!(registry.len(), 28);

        let names: Vec<_> = registry.list_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names[0], "create_wallet");
        assert_eq!(names[27], "get_network_info");
        assert!(names.contains(&"get_chain_status"));
    }

    #[tokio::test]
    async fn test_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let registry = tools(dir.path()).load().await.unwrap();
        let vote = registry
            .list_tools()
            .iter()
            .find(|t| t.name == "vote_on_proposal")
            .unwrap();
        assert_eq!(vote.input_schema["properties"]["vote"]["enum"][2], "abstain");
        assert_eq!(vote.input_schema["required"].as_array().unwrap().len(), 4);

        let pools = registry.list_tools().iter().find(|t| t.name == "get_pools").unwrap();
        assert_eq!(pools.input_schema, json!({"type": "object", "properties": {}}));
    }

    #[tokio::test]
    async fn test_defaults_and_argument_errors() {
        let dir = tempfile::tempdir().unwrap();
        let registry = tools(dir.path()).load().await.unwrap();

        let info = registry.invoke("get_network_info", json!({})).await;
        assert!(info.success);
        assert_eq!(info.result.unwrap()["chain"], "zetachain");

        let missing = registry.invoke("get_pool_info", json!({})).await;
        assert!(!missing.success);
        assert!(missing.error.unwrap().starts_with("Invalid arguments"));

        let extra = registry.invoke("get_pools", json!({"unexpected": 1})).await;
        assert!(!extra.success);
    }

    #[tokio::test]
    async fn test_domain_failure_becomes_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let registry = tools(dir.path()).load().await.unwrap();
        let result = registry.invoke("get_pool_info", json!({"pool_id": "NOPE"})).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Pool not found"));
    }
}
