//! Incentive controller state
//!
//! Global emission rate and allocation total, plus each market's allocation
//! weight on both sides: the aToken pool (supply) and the variable-debt pool
//! (borrow).

use alloy_primitives::{Address, U256};
use eyre::{Result, WrapErr};
use std::collections::HashMap;
use tracing::debug;

use super::reserves::MarketState;
use crate::contracts::IncentivesController;
use crate::registry::ChainConfig;
use crate::rpc::{keyed, RemoteCaller};

/// One allocation lookup and the token it was queried against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolWeight {
    pub token: Address,
    pub alloc_point: U256,
}

#[derive(Debug, Clone, Default)]
pub struct IncentiveState {
    /// Raw emission rate, 18 decimals
    pub rewards_per_second: U256,
    pub total_alloc_point: U256,
    /// Keyed by underlying asset, queried by aToken
    pub supply: HashMap<Address, PoolWeight>,
    /// Keyed by underlying asset, queried by variable-debt token
    pub borrow: HashMap<Address, PoolWeight>,
}

pub async fn fetch_incentive_state(
    rpc: &dyn RemoteCaller,
    cfg: &ChainConfig,
    state: &MarketState,
) -> Result<IncentiveState> {
    let controller = IncentivesController::new(cfg.incentive_controller);
    let a_tokens = state.a_tokens()?;
    let debt_tokens = state.debt_tokens()?;

    let (rewards_per_second, total_alloc_point, supply_points, borrow_points) = tokio::try_join!(
        controller.rewards_per_second(rpc),
        controller.total_alloc_point(rpc),
        controller.alloc_points(rpc, &a_tokens),
        controller.alloc_points(rpc, &debt_tokens),
    )
    .wrap_err_with(|| format!("{}: incentive state", cfg.chain))?;

    let supply = keyed(&state.markets, weights(&a_tokens, supply_points))?;
    let borrow = keyed(&state.markets, weights(&debt_tokens, borrow_points))?;

    debug!(
        "{}: rewardsPerSecond={} totalAllocPoint={}",
        cfg.chain, rewards_per_second, total_alloc_point
    );

    Ok(IncentiveState {
        rewards_per_second,
        total_alloc_point,
        supply,
        borrow,
    })
}

fn weights(tokens: &[Address], points: Vec<U256>) -> Vec<PoolWeight> {
    tokens
        .iter()
        .zip(points)
        .map(|(token, alloc_point)| PoolWeight { token: *token, alloc_point })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::reserves::{enumerate_markets, fetch_market_state};
    use crate::mock::{MockChain, MockMarket};
    use crate::registry::Chain;

    #[tokio::test]
    async fn test_weights_follow_their_side_token() {
        let chain = MockChain::new(Chain::Arbitrum)
            .rewards(U256::from(10u64).pow(U256::from(18u64)), U256::from(1000u64))
            .with_market(MockMarket::new(1).alloc(250, 100))
            .with_market(MockMarket::new(2).alloc(0, 650));
        let cfg = Chain::Arbitrum.config();

        let markets = enumerate_markets(&chain, cfg).await.unwrap();
        let state = fetch_market_state(&chain, cfg, &markets).await.unwrap();
        let incentives = fetch_incentive_state(&chain, cfg, &state).await.unwrap();

        assert_eq!(incentives.total_alloc_point, U256::from(1000u64));
        assert_eq!(incentives.supply.len(), 2);
        assert_eq!(incentives.borrow.len(), 2);

        for market in chain.markets() {
            let supply = incentives.supply[&market.asset];
            let borrow = incentives.borrow[&market.asset];
            assert_eq!(supply.token, market.a_token);
            assert_eq!(borrow.token, market.debt_token);
            assert_eq!(supply.alloc_point, U256::from(market.supply_alloc));
            assert_eq!(borrow.alloc_point, U256::from(market.borrow_alloc));
        }
    }

    #[test]
    fn test_weights_pairing() {
        let tokens = [Address::repeat_byte(1), Address::repeat_byte(2)];
        let w = weights(&tokens, vec![U256::from(5u64), U256::from(6u64)]);
        assert_eq!(w[1].token, tokens[1]);
        assert_eq!(w[1].alloc_point, U256::from(6u64));
    }
}
