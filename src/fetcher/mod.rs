//! On-chain state for one chain's markets
//!
//! - **reserves**: reserve list, reserve data, token metadata, balances,
//!   debt supply and risk configuration
//! - **incentives**: emission rate and per-market allocation weights
//!
//! Every batch result is keyed by underlying asset as soon as it arrives;
//! `snapshots` joins them back per market by key.

mod incentives;
mod reserves;

pub use incentives::{fetch_incentive_state, IncentiveState, PoolWeight};
pub use reserves::{
    enumerate_markets, fetch_market_state, MarketState, ReserveConfig, ReserveTokens, TokenMeta,
};

use alloy_primitives::{Address, U256};
use eyre::{eyre, Result};

/// Joined view of one market, ready for derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub asset: Address,
    pub reserve: ReserveTokens,
    pub token: TokenMeta,
    pub config: ReserveConfig,
    pub balance: U256,
    pub debt_supply: U256,
    pub supply_weight: PoolWeight,
    pub borrow_weight: PoolWeight,
}

/// Join reserve and incentive state per market, in market order
pub fn snapshots(state: &MarketState, incentives: &IncentiveState) -> Result<Vec<MarketSnapshot>> {
    state
        .markets
        .iter()
        .map(|asset| {
            let missing = |what: &str| eyre!("Missing {} for market {:?}", what, asset);

            Ok(MarketSnapshot {
                asset: *asset,
                reserve: *state.reserve(asset)?,
                token: state.tokens.get(asset).cloned().ok_or_else(|| missing("token metadata"))?,
                config: *state.configs.get(asset).ok_or_else(|| missing("configuration"))?,
                balance: *state.balances.get(asset).ok_or_else(|| missing("balance"))?,
                debt_supply: *state.debt_supply.get(asset).ok_or_else(|| missing("debt supply"))?,
                supply_weight: *incentives.supply.get(asset).ok_or_else(|| missing("supply weight"))?,
                borrow_weight: *incentives.borrow.get(asset).ok_or_else(|| missing("borrow weight"))?,
            })
        })
        .collect()
}
