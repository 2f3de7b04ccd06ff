//! Market enumeration and per-market reserve state
//!
//! Two stages per chain:
//! 1. reserve data, decimals, symbols and configuration (all keyed by the
//!    underlying asset, so they run together)
//! 2. aToken balances and variable-debt supply, which need the token
//!    addresses stage 1 returned

use alloy_primitives::{Address, U256};
use eyre::{eyre, Result, WrapErr};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use crate::contracts::{Erc20, LendingPool, ProtocolDataProvider};
use crate::registry::ChainConfig;
use crate::rpc::{keyed, RemoteCaller};

// ============================================
// TYPES
// ============================================

/// Rate fields and derived token addresses from `getReserveData`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveTokens {
    pub a_token: Address,
    pub variable_debt_token: Address,
    /// Supply rate, ray (1e27)
    pub liquidity_rate: u128,
    /// Variable borrow rate, ray (1e27)
    pub variable_borrow_rate: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub decimals: u8,
    pub symbol: String,
}

/// Risk flags from the data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveConfig {
    /// Basis points
    pub ltv: U256,
    pub borrowing_enabled: bool,
    pub is_active: bool,
    pub is_frozen: bool,
}

/// Everything the reserve side knows about a chain's markets.
///
/// `markets` is the canonical order; every map is keyed by underlying asset.
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    pub markets: Vec<Address>,
    pub reserves: HashMap<Address, ReserveTokens>,
    pub tokens: HashMap<Address, TokenMeta>,
    pub configs: HashMap<Address, ReserveConfig>,
    /// Raw underlying held by each market's aToken
    pub balances: HashMap<Address, U256>,
    /// Raw variable-debt token supply
    pub debt_supply: HashMap<Address, U256>,
}

impl MarketState {
    pub fn reserve(&self, asset: &Address) -> Result<&ReserveTokens> {
        self.reserves
            .get(asset)
            .ok_or_else(|| eyre!("No reserve data for {:?}", asset))
    }

    /// aToken address of every market, market order
    pub fn a_tokens(&self) -> Result<Vec<Address>> {
        self.markets.iter().map(|m| Ok(self.reserve(m)?.a_token)).collect()
    }

    /// Variable-debt token address of every market, market order
    pub fn debt_tokens(&self) -> Result<Vec<Address>> {
        self.markets
            .iter()
            .map(|m| Ok(self.reserve(m)?.variable_debt_token))
            .collect()
    }
}

// ============================================
// MARKET ENUMERATOR
// ============================================

/// Active reserve list, the index order for everything after it
pub async fn enumerate_markets(rpc: &dyn RemoteCaller, cfg: &ChainConfig) -> Result<Vec<Address>> {
    let markets = LendingPool::new(cfg.lending_pool)
        .reserves_list(rpc)
        .await
        .wrap_err_with(|| format!("{}: failed to enumerate markets", cfg.chain))?;

    debug!("{}: {} reserves listed", cfg.chain, markets.len());
    Ok(markets)
}

// ============================================
// MARKET STATE FETCHER
// ============================================

pub async fn fetch_market_state(
    rpc: &dyn RemoteCaller,
    cfg: &ChainConfig,
    markets: &[Address],
) -> Result<MarketState> {
    let start = Instant::now();
    let pool = LendingPool::new(cfg.lending_pool);
    let provider = ProtocolDataProvider::new(cfg.data_provider);

    // ============================================
    // STAGE 1: keyed by the asset itself
    // ============================================
    let (reserve_data, decimals, symbols, configs) = tokio::try_join!(
        pool.reserve_data(rpc, markets),
        Erc20::decimals(rpc, markets),
        Erc20::symbols(rpc, markets),
        provider.reserve_configuration(rpc, markets),
    )
    .wrap_err_with(|| format!("{}: reserve state", cfg.chain))?;

    let reserves = keyed(
        markets,
        reserve_data
            .into_iter()
            .map(|r| ReserveTokens {
                a_token: r.aTokenAddress,
                variable_debt_token: r.variableDebtTokenAddress,
                liquidity_rate: r.currentLiquidityRate,
                variable_borrow_rate: r.currentVariableBorrowRate,
            })
            .collect(),
    )?;

    let tokens = keyed(
        markets,
        decimals
            .into_iter()
            .zip(symbols)
            .map(|(decimals, symbol)| TokenMeta { decimals, symbol })
            .collect(),
    )?;

    let configs = keyed(
        markets,
        configs
            .into_iter()
            .map(|c| ReserveConfig {
                ltv: c.ltv,
                borrowing_enabled: c.borrowingEnabled,
                is_active: c.isActive,
                is_frozen: c.isFrozen,
            })
            .collect(),
    )?;

    let mut state = MarketState {
        markets: markets.to_vec(),
        reserves,
        tokens,
        configs,
        ..Default::default()
    };

    // ============================================
    // STAGE 2: parameterized by reserve data
    // ============================================
    let balance_pairs: Vec<(Address, Address)> = markets
        .iter()
        .zip(state.a_tokens()?)
        .map(|(asset, a_token)| (*asset, a_token))
        .collect();
    let debt_tokens = state.debt_tokens()?;

    let (balances, debt_supply) = tokio::try_join!(
        Erc20::balances(rpc, &balance_pairs),
        Erc20::total_supplies(rpc, &debt_tokens),
    )
    .wrap_err_with(|| format!("{}: balances", cfg.chain))?;

    state.balances = keyed(markets, balances)?;
    state.debt_supply = keyed(markets, debt_supply)?;

    debug!(
        "{}: market state for {} reserves in {:?}",
        cfg.chain,
        markets.len(),
        start.elapsed()
    );

    Ok(state)
}
