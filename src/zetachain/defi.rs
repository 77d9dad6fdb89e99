//! DeFi operations on ZetaChain
//!
//! Constant-product liquidity pools held in memory. Pool and position state
//! share a single lock so each operation sees a consistent snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{DomainError, Result, ValidationError};
use crate::zetachain::now_secs;
use crate::zetachain::validation::{parse_amount, validate_address};

/// Share of TVL assumed to trade every 24 hours
const DAILY_VOLUME_RATIO: f64 = 0.1;

/// A two-token liquidity pool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: f64,
    pub reserve_b: f64,
    pub total_liquidity: f64,
    pub apy: f64,
    /// Swap fee in percent
    pub fee: f64,
    pub tvl: f64,
}

impl Pool {
    #[allow(clippy::too_many_arguments)]
    fn new(
        token_a: &str,
        token_b: &str,
        reserve_a: f64,
        reserve_b: f64,
        total_liquidity: f64,
        apy: f64,
        fee: f64,
        tvl: f64,
    ) -> Self {
        Self {
            id: format!("{}_{}", token_a, token_b),
            token_a: token_a.to_string(),
            token_b: token_b.to_string(),
            reserve_a,
            reserve_b,
            total_liquidity,
            apy,
            fee,
            tvl,
        }
    }

    fn share_of(&self, lp_tokens: f64) -> (f64, f64) {
        if self.total_liquidity <= 0.0 {
            return (0.0, 0.0);
        }
        let share = lp_tokens / self.total_liquidity;
        (share * self.reserve_a, share * self.reserve_b)
    }

    fn refresh_tvl(&mut self) {
        self.tvl = self.reserve_a + self.reserve_b;
    }
}

/// A liquidity position held by a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub pool_id: String,
    pub lp_tokens: f64,
    #[serde(rename = "tokenAAmount")]
    pub token_a_amount: f64,
    #[serde(rename = "tokenBAmount")]
    pub token_b_amount: f64,
    pub timestamp: i64,
}

fn seed_pools() -> BTreeMap<String, Pool> {
    [
        Pool::new("ZETA", "USDC", 1_000_000.0, 2_000_000.0, 2_000_000.0, 15.5, 0.3, 3_000_000.0),
        Pool::new("ETH", "USDC", 500.0, 1_000_000.0, 1_000_000.0, 12.8, 0.3, 2_000_000.0),
        Pool::new("BTC", "USDC", 20.0, 800_000.0, 800_000.0, 8.2, 0.5, 1_600_000.0),
    ]
    .into_iter()
    .map(|p| (p.id.clone(), p))
    .collect()
}

#[derive(Debug)]
struct DefiState {
    pools: BTreeMap<String, Pool>,
    /// Positions keyed by lowercase user address
    positions: BTreeMap<String, Vec<Position>>,
}

impl DefiState {
    fn pool_mut(&mut self, pool_id: &str) -> Result<&mut Pool> {
        self.pools
            .get_mut(pool_id)
            .ok_or_else(|| DomainError::PoolNotFound.into())
    }
}

fn require_user(user_address: &str) -> Result<()> {
    if validate_address(user_address) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRoleAddress { role: "user" }.into())
    }
}

/// Manages liquidity pools, swaps and positions
pub struct DefiManager {
    state: Mutex<DefiState>,
}

impl Default for DefiManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DefiManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DefiState {
                pools: seed_pools(),
                positions: BTreeMap::new(),
            }),
        }
    }

    /// All pools, highest TVL first
    pub async fn get_pools(&self) -> Result<Value> {
        let state = self.state.lock().await;
        let mut pools: Vec<&Pool> = state.pools.values().collect();
        pools.sort_by(|a, b| b.tvl.total_cmp(&a.tvl));

        Ok(json!({ "pools": pools, "count": pools.len() }))
    }

    /// One pool with derived price and volume figures
    pub async fn get_pool_info(&self, pool_id: &str) -> Result<Value> {
        let state = self.state.lock().await;
        let pool = state.pools.get(pool_id).ok_or(DomainError::PoolNotFound)?;

        let volume_24h = pool.tvl * DAILY_VOLUME_RATIO;
        let mut value = serde_json::to_value(pool)?;
        if let Some(obj) = value.as_object_mut() {
            let price_ratio = if pool.reserve_a > 0.0 {
                json!(pool.reserve_b / pool.reserve_a)
            } else {
                Value::Null
            };
            obj.insert("priceRatio".to_string(), price_ratio);
            obj.insert("volume24h".to_string(), json!(volume_24h));
            obj.insert("fees24h".to_string(), json!(volume_24h * pool.fee / 100.0));
        }

        Ok(json!({ "pool": value }))
    }

    /// Deposit both tokens and mint LP tokens
    pub async fn add_liquidity(
        &self,
        pool_id: &str,
        token_a_amount: &str,
        token_b_amount: &str,
        user_address: &str,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        let pool = state.pool_mut(pool_id)?;
        require_user(user_address)?;

        let invalid = || ValidationError::InvalidAmount { what: "amounts" };
        let amount_a = parse_amount(token_a_amount).ok_or_else(invalid)?;
        let amount_b = parse_amount(token_b_amount).ok_or_else(invalid)?;

        let lp_tokens = if pool.reserve_a <= 0.0 || pool.reserve_b <= 0.0 {
            (amount_a * amount_b).sqrt()
        } else {
            let by_a = amount_a / pool.reserve_a * pool.total_liquidity;
            let by_b = amount_b / pool.reserve_b * pool.total_liquidity;
            by_a.min(by_b)
        };

        pool.reserve_a += amount_a;
        pool.reserve_b += amount_b;
        pool.total_liquidity += lp_tokens;
        pool.refresh_tvl();
        info!(
            user = user_address,
            pool_id,
            amount_a,
            token_a = %pool.token_a,
            amount_b,
            token_b = %pool.token_b,
            "Added liquidity"
        );

        state
            .positions
            .entry(user_address.to_lowercase())
            .or_default()
            .push(Position {
                pool_id: pool_id.to_string(),
                lp_tokens,
                token_a_amount: amount_a,
                token_b_amount: amount_b,
                timestamp: now_secs(),
            });

        Ok(json!({
            "transaction": {
                "poolId": pool_id,
                "lpTokens": lp_tokens,
                "tokenAAmount": amount_a,
                "tokenBAmount": amount_b,
                "userAddress": user_address,
            }
        }))
    }

    /// Burn LP tokens and return the matching share of reserves
    pub async fn remove_liquidity(
        &self,
        pool_id: &str,
        lp_tokens: &str,
        user_address: &str,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        let pool = state.pool_mut(pool_id)?;
        require_user(user_address)?;

        let lp_amount =
            parse_amount(lp_tokens).ok_or(ValidationError::InvalidAmount { what: "LP token amount" })?;
        if lp_amount > pool.total_liquidity {
            return Err(DomainError::InsufficientLiquidity {
                pool_id: pool_id.to_string(),
            }
            .into());
        }

        let (amount_a, amount_b) = pool.share_of(lp_amount);
        pool.reserve_a -= amount_a;
        pool.reserve_b -= amount_b;
        pool.total_liquidity -= lp_amount;
        pool.refresh_tvl();

        info!(user = user_address, pool_id, lp_amount, "Removed liquidity");
        Ok(json!({
            "transaction": {
                "poolId": pool_id,
                "lpTokens": lp_amount,
                "tokenAAmount": amount_a,
                "tokenBAmount": amount_b,
                "userAddress": user_address,
            }
        }))
    }

    /// Swap one pool token for the other along the constant-product curve
    pub async fn swap_tokens(
        &self,
        pool_id: &str,
        token_in: &str,
        amount_in: &str,
        user_address: &str,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        let pool = state.pool_mut(pool_id)?;
        require_user(user_address)?;

        let amount =
            parse_amount(amount_in).ok_or(ValidationError::InvalidAmount { what: "input amount" })?;

        let a_to_b = if token_in == pool.token_a {
            true
        } else if token_in == pool.token_b {
            false
        } else {
            return Err(DomainError::TokenNotInPool {
                token: token_in.to_string(),
                pool_id: pool_id.to_string(),
            }
            .into());
        };

        let (reserve_in, reserve_out) = if a_to_b {
            (pool.reserve_a, pool.reserve_b)
        } else {
            (pool.reserve_b, pool.reserve_a)
        };
        let amount_out = amount * reserve_out / (reserve_in + amount);
        let price_impact = amount / (reserve_in + amount) * 100.0;

        let token_out = if a_to_b {
            pool.reserve_a += amount;
            pool.reserve_b -= amount_out;
            pool.token_b.clone()
        } else {
            pool.reserve_b += amount;
            pool.reserve_a -= amount_out;
            pool.token_a.clone()
        };

        info!(
            user = user_address,
            pool_id,
            amount,
            token_in,
            amount_out,
            token_out = %token_out,
            "Token swap"
        );
        Ok(json!({
            "swap": {
                "poolId": pool_id,
                "tokenIn": token_in,
                "tokenOut": token_out,
                "amountIn": amount,
                "amountOut": amount_out,
                "priceImpact": format!("{:.2}%", price_impact),
                "userAddress": user_address,
            }
        }))
    }

    /// Positions of a user valued at current reserves
    pub async fn get_user_positions(&self, user_address: &str) -> Result<Value> {
        require_user(user_address)?;

        let state = self.state.lock().await;
        let positions: Vec<Value> = state
            .positions
            .get(&user_address.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|position| {
                let mut value = json!(position);
                if let (Some(pool), Some(obj)) =
                    (state.pools.get(&position.pool_id), value.as_object_mut())
                {
                    let (current_a, current_b) = pool.share_of(position.lp_tokens);
                    obj.insert("currentValueA".to_string(), json!(current_a));
                    obj.insert("currentValueB".to_string(), json!(current_b));
                    obj.insert("totalValue".to_string(), json!(current_a + current_b));
                }
                value
            })
            .collect();

        Ok(json!({ "positions": positions, "count": positions.len() }))
    }

    /// Platform-wide totals
    pub async fn get_defi_stats(&self) -> Result<Value> {
        let state = self.state.lock().await;
        let total_pools = state.pools.len();
        let total_tvl: f64 = state.pools.values().map(|p| p.tvl).sum();
        let average_apy = state.pools.values().map(|p| p.apy).sum::<f64>() / total_pools.max(1) as f64;
        let total_positions: usize = state.positions.values().map(Vec::len).sum();

        Ok(json!({
            "stats": {
                "totalTVL": total_tvl,
                "totalPools": total_pools,
                "averageAPY": format!("{:.1}%", average_apy),
                "totalPositions": total_positions,
                "uniqueUsers": state.positions.len(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "0xAbCdEf0123456789012345678901234567890123";

    fn approx(value: &Value, expected: f64) -> bool {
        (value.as_f64().unwrap() - expected).abs() < 1e-6
    }

    #[tokio::test]
    async fn test_pools_by_tvl() {
        let defi = DefiManager::new();
        let result = defi.get_pools().await.unwrap();
        assert_eq!(result["count"], 3);
        assert_eq!(result["pools"][0]["id"], "ZETA_USDC");
        assert_eq!(result["pools"][2]["id"], "BTC_USDC");
    }

    #[tokio::test]
    async fn test_pool_info() {
        let defi = DefiManager::new();
        let result = defi.get_pool_info("ETH_USDC").await.unwrap();
        assert!(approx(&result["pool"]["priceRatio"], 2000.0));
        assert!(approx(&result["pool"]["volume24h"], 200_000.0));
        assert!(approx(&result["pool"]["fees24h"], 600.0));

        let err = defi.get_pool_info("DOGE_USDC").await.unwrap_err();
        assert_eq!(err.to_string(), "Pool not found");
    }

    #[tokio::test]
    async fn test_add_and_positions() {
        let defi = DefiManager::new();
        let result = defi
            .add_liquidity("ZETA_USDC", "100", "300", USER)
            .await
            .unwrap();
        // min(100/1e6, 300/2e6) * 2e6
        assert!(approx(&result["transaction"]["lpTokens"], 200.0));

        let positions = defi.get_user_positions(&USER.to_lowercase()).await.unwrap();
        assert_eq!(positions["count"], 1);
        assert!(positions["positions"][0]["totalValue"].as_f64().unwrap() > 0.0);

        let err = defi.add_liquidity("ZETA_USDC", "0", "1", USER).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid amounts");
        let err = defi.add_liquidity("ZETA_USDC", "1", "1", "0x1").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid user address");
    }

    #[tokio::test]
    async fn test_remove_liquidity() {
        let defi = DefiManager::new();
        let result = defi.remove_liquidity("ETH_USDC", "100000", USER).await.unwrap();
        assert!(approx(&result["transaction"]["tokenAAmount"], 50.0));
        assert!(approx(&result["transaction"]["tokenBAmount"], 100_000.0));

        let err = defi
            .remove_liquidity("ETH_USDC", "5000000", USER)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient liquidity in pool ETH_USDC");
    }

    #[tokio::test]
    async fn test_swap() {
        let defi = DefiManager::new();
        let result = defi.swap_tokens("BTC_USDC", "BTC", "1", USER).await.unwrap();
        // 1 * 800000 / (20 + 1)
        assert!(approx(&result["swap"]["amountOut"], 800_000.0 / 21.0));
        assert_eq!(result["swap"]["tokenOut"], "USDC");
        assert_eq!(result["swap"]["priceImpact"], "4.76%");

        let reverse = defi.swap_tokens("BTC_USDC", "USDC", "1000", USER).await.unwrap();
        assert_eq!(reverse["swap"]["tokenOut"], "BTC");

        let err = defi.swap_tokens("BTC_USDC", "ETH", "1", USER).await.unwrap_err();
        assert_eq!(err.to_string(), "Token ETH is not part of pool BTC_USDC");
    }

    #[tokio::test]
    async fn test_stats() {
        let defi = DefiManager::new();
        defi.add_liquidity("BTC_USDC", "1", "40000", USER).await.unwrap();
        let stats = defi.get_defi_stats().await.unwrap();
        assert_eq!(stats["stats"]["totalPools"], 3);
        assert_eq!(stats["stats"]["averageAPY"], "12.2%");
        assert_eq!(stats["stats"]["totalPositions"], 1);
        assert_eq!(stats["stats"]["uniqueUsers"], 1);
    }
}
