//! Price Resolver - coins.llama.fi integration
//!
//! Resolves chain-qualified asset ids to current USD prices in one request.
//! Ids the service does not cover are simply absent from the result.
//!
//! API: https://coins.llama.fi/prices/current/{chain:address,...}

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};

use crate::registry::{Chain, REWARD_PRICE_CHAIN, REWARD_TOKEN};

// ============================================
// CONSTANTS
// ============================================

pub const DEFAULT_PRICES_API_URL: &str = "https://coins.llama.fi";

/// Timeout for API calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ============================================
// IDS AND QUOTES
// ============================================

/// `chain:0xaddress`, lower-cased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoinId {
    pub chain: Chain,
    pub address: Address,
}

impl CoinId {
    pub fn new(chain: Chain, address: Address) -> Self {
        Self { chain, address }
    }

    /// The reward token, always under its pinned reference chain
    pub fn reward() -> Self {
        Self::new(REWARD_PRICE_CHAIN, REWARD_TOKEN)
    }

    pub fn key(&self) -> String {
        format!("{}:{:?}", self.chain, self.address).to_lowercase()
    }
}

impl std::fmt::Display for CoinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// USD prices by lower-cased id; an id with no entry has no known price
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceQuotes {
    prices: HashMap<String, f64>,
}

impl PriceQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, price: f64) {
        self.prices.insert(key.to_lowercase(), price);
    }

    pub fn get(&self, id: &CoinId) -> Option<f64> {
        self.prices.get(&id.key()).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

// ============================================
// PRICE SOURCE SEAM
// ============================================

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn current_prices(&self, coins: &[CoinId]) -> Result<PriceQuotes>;
}

/// Every market's underlying on `chain`, then the reward token on its reference chain
pub fn price_request(chain: Chain, markets: &[Address]) -> Vec<CoinId> {
    markets
        .iter()
        .map(|m| CoinId::new(chain, *m))
        .chain(std::iter::once(CoinId::reward()))
        .collect()
}

pub async fn resolve_prices(
    source: &dyn PriceSource,
    chain: Chain,
    markets: &[Address],
) -> Result<PriceQuotes> {
    let request = price_request(chain, markets);
    let quotes = source
        .current_prices(&request)
        .await
        .wrap_err_with(|| format!("{}: price lookup", chain))?;

    debug!("{}: {}/{} prices resolved", chain, quotes.len(), request.len());
    Ok(quotes)
}

// ============================================
// API RESPONSE TYPES
// ============================================

#[derive(Debug, Deserialize)]
struct CoinsResponse {
    #[serde(default)]
    coins: HashMap<String, CoinPrice>,
}

/// Only the price is read; the service also sends symbol, decimals and timestamp
#[derive(Debug, Deserialize)]
struct CoinPrice {
    price: Option<f64>,
}

impl CoinsResponse {
    fn into_quotes(self) -> PriceQuotes {
        let mut quotes = PriceQuotes::new();
        for (key, coin) in self.coins {
            match coin.price {
                Some(price) => quotes.insert(&key, price),
                None => trace!("No price field for {}", key),
            }
        }
        quotes
    }
}

// ============================================
// LLAMA PRICES CLIENT
// ============================================

pub struct LlamaPrices {
    http_client: Client,
    base_url: String,
}

impl LlamaPrices {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, coins: &[CoinId]) -> String {
        let ids: Vec<String> = coins.iter().map(CoinId::key).collect();
        format!("{}/prices/current/{}", self.base_url, ids.join(","))
    }
}

#[async_trait]
impl PriceSource for LlamaPrices {
    async fn current_prices(&self, coins: &[CoinId]) -> Result<PriceQuotes> {
        if coins.is_empty() {
            return Ok(PriceQuotes::new());
        }

        let response: CoinsResponse = self.http_client
            .get(self.url(coins))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.into_quotes())
    }
}
