//! Metric Derivation Engine
//!
//! Pure functions from joined market snapshots to per-market metrics.
//! Anything that needs a USD price is an `Option<f64>`: an absent quote stays
//! absent instead of turning into zero or NaN, and the aggregator drops the
//! market when it builds output records.
//!
//! Reward APY divides a market's share of emissions by the *whole* market's
//! supply (or borrow) value. Only part of that value is actually eligible for
//! rewards on Radiant (emissions require locked dLP), so the figure
//! overstates the base and understates the APY for eligible positions. Kept
//! as-is until an eligible-value source exists.

use alloy_primitives::{Address, U256};
use tracing::trace;

use crate::fetcher::{IncentiveState, MarketSnapshot};
use crate::prices::{CoinId, PriceQuotes};
use crate::registry::{Chain, ChainConfig, APP_URL};

// ============================================
// UNIT CONSTANTS
// ============================================

/// Ray rate (1e27) to percent
pub const RAY_TO_PERCENT: f64 = 1e25;

/// LTV basis points to fraction
pub const LTV_SCALE: f64 = 1e4;

/// Emission rate decimals
pub const REWARD_SCALE: f64 = 1e18;

pub const SECONDS_PER_YEAR: f64 = 86_400.0 * 365.0;

// ============================================
// TYPES
// ============================================

/// Derived metrics for one active market
#[derive(Debug, Clone, PartialEq)]
pub struct MarketMetrics {
    pub chain: Chain,
    pub asset: Address,
    pub a_token: Address,
    pub symbol: String,
    pub tvl_usd: Option<f64>,
    pub total_supply_usd: Option<f64>,
    pub total_borrow_usd: Option<f64>,
    pub apy_base: f64,
    pub apy_base_borrow: f64,
    pub apy_reward: Option<f64>,
    pub apy_reward_borrow: Option<f64>,
    pub ltv: f64,
    pub borrowable: bool,
    pub frozen: bool,
    pub url: String,
}

// ============================================
// CONVERSIONS
// ============================================

/// Raw token amount to whole tokens
pub fn scale_amount(raw: U256, decimals: u8) -> f64 {
    f64::from(raw) / 10_f64.powi(decimals as i32)
}

/// Ray-denominated rate to percent
pub fn ray_to_apy(rate: u128) -> f64 {
    rate as f64 / RAY_TO_PERCENT
}

pub fn ltv_fraction(ltv_bps: U256) -> f64 {
    f64::from(ltv_bps) / LTV_SCALE
}

/// Annual emissions in USD, or `None` without a reward price
pub fn reward_per_year(rewards_per_second: U256, reward_price: Option<f64>) -> Option<f64> {
    reward_price.map(|price| f64::from(rewards_per_second) / REWARD_SCALE * SECONDS_PER_YEAR * price)
}

/// A side's share of emissions as a percentage of that side's USD value
pub fn reward_apy(
    alloc_point: U256,
    total_alloc_point: U256,
    reward_per_year: Option<f64>,
    base_usd: Option<f64>,
) -> Option<f64> {
    let (per_year, base) = (reward_per_year?, base_usd?);
    let share = f64::from(alloc_point) / f64::from(total_alloc_point);
    Some(share * per_year / base * 100.0)
}

/// Asset-detail link for a market, lower-cased
pub fn market_url(cfg: &ChainConfig, asset: &Address) -> String {
    format!(
        "{}{:?}-{:?}{:?}-borrow",
        APP_URL, asset, asset, cfg.url_suffix
    )
    .to_lowercase()
}

// ============================================
// DERIVATION
// ============================================

/// Metrics for one market; `None` for an inactive reserve
pub fn derive_market(
    cfg: &ChainConfig,
    snapshot: &MarketSnapshot,
    incentives: &IncentiveState,
    prices: &PriceQuotes,
) -> Option<MarketMetrics> {
    if !snapshot.config.is_active {
        trace!("{}: skipping inactive reserve {:?}", cfg.chain, snapshot.asset);
        return None;
    }

    let price = prices.get(&CoinId::new(cfg.chain, snapshot.asset));
    let decimals = snapshot.token.decimals;

    let tvl_usd = price.map(|p| scale_amount(snapshot.balance, decimals) * p);
    let total_borrow_usd = price.map(|p| scale_amount(snapshot.debt_supply, decimals) * p);
    let total_supply_usd = tvl_usd.zip(total_borrow_usd).map(|(tvl, borrow)| tvl + borrow);

    let per_year = reward_per_year(incentives.rewards_per_second, prices.get(&CoinId::reward()));

    Some(MarketMetrics {
        chain: cfg.chain,
        asset: snapshot.asset,
        a_token: snapshot.reserve.a_token,
        symbol: snapshot.token.symbol.clone(),
        tvl_usd,
        total_supply_usd,
        total_borrow_usd,
        apy_base: ray_to_apy(snapshot.reserve.liquidity_rate),
        apy_base_borrow: ray_to_apy(snapshot.reserve.variable_borrow_rate),
        apy_reward: reward_apy(
            snapshot.supply_weight.alloc_point,
            incentives.total_alloc_point,
            per_year,
            total_supply_usd,
        ),
        apy_reward_borrow: reward_apy(
            snapshot.borrow_weight.alloc_point,
            incentives.total_alloc_point,
            per_year,
            total_borrow_usd,
        ),
        ltv: ltv_fraction(snapshot.config.ltv),
        borrowable: snapshot.config.borrowing_enabled,
        frozen: snapshot.config.is_frozen,
        url: market_url(cfg, &snapshot.asset),
    })
}

/// Metrics for every active market, market order
pub fn derive_chain(
    cfg: &ChainConfig,
    snapshots: &[MarketSnapshot],
    incentives: &IncentiveState,
    prices: &PriceQuotes,
) -> Vec<MarketMetrics> {
    snapshots
        .iter()
        .filter_map(|s| derive_market(cfg, s, incentives, prices))
        .collect()
}
