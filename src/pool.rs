//! Output record shared with every other protocol's yield source

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::metrics::MarketMetrics;
use crate::registry::{Chain, PROJECT, REWARD_TOKEN};

pub const FROZEN_META: &str = "frozen";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    /// `{aToken}-{chain}`, lower-cased; primary key for consumers
    pub pool: String,
    pub symbol: String,
    pub project: String,
    pub chain: Chain,
    pub tvl_usd: f64,
    pub apy_base: f64,
    pub apy_reward: f64,
    pub underlying_tokens: Vec<Address>,
    pub total_supply_usd: f64,
    pub total_borrow_usd: f64,
    pub apy_base_borrow: f64,
    pub apy_reward_borrow: f64,
    pub reward_tokens: Vec<Address>,
    pub ltv: f64,
    pub borrowable: bool,
    pub pool_meta: Option<String>,
    pub url: String,
}

pub fn pool_id(a_token: &Address, chain: Chain) -> String {
    format!("{:?}-{}", a_token, chain).to_lowercase()
}

impl PoolRecord {
    /// Build the record only when every numeric field is known and finite
    pub fn from_metrics(m: MarketMetrics) -> Option<Self> {
        let record = Self {
            pool: pool_id(&m.a_token, m.chain),
            symbol: m.symbol,
            project: PROJECT.to_string(),
            chain: m.chain,
            tvl_usd: m.tvl_usd?,
            apy_base: m.apy_base,
            apy_reward: m.apy_reward?,
            underlying_tokens: vec![m.asset],
            total_supply_usd: m.total_supply_usd?,
            total_borrow_usd: m.total_borrow_usd?,
            apy_base_borrow: m.apy_base_borrow,
            apy_reward_borrow: m.apy_reward_borrow?,
            reward_tokens: vec![REWARD_TOKEN],
            ltv: m.ltv,
            borrowable: m.borrowable,
            pool_meta: m.frozen.then(|| FROZEN_META.to_string()),
            url: m.url,
        };

        record.is_finite().then_some(record)
    }

    pub fn numeric_fields(&self) -> [f64; 8] {
        [
            self.tvl_usd,
            self.apy_base,
            self.apy_reward,
            self.total_supply_usd,
            self.total_borrow_usd,
            self.apy_base_borrow,
            self.apy_reward_borrow,
            self.ltv,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.numeric_fields().iter().all(|v| v.is_finite())
    }
}
