//! Aggregator
//!
//! One pipeline per chain, all chains concurrently. A failed chain becomes a
//! `ChainFailure` in the report and never takes its siblings down with it.
//! Output records are built here, and only here, from derived metrics; any
//! market with an absent or non-finite value is dropped at that point.

use eyre::{Result, WrapErr};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, trace, warn};

use crate::config::Config;
use crate::fetcher::{enumerate_markets, fetch_incentive_state, fetch_market_state, snapshots};
use crate::metrics::{derive_chain, MarketMetrics};
use crate::pool::PoolRecord;
use crate::prices::{resolve_prices, LlamaPrices, PriceSource};
use crate::registry::{Chain, ChainConfig};
use crate::rpc::{RemoteCaller, RpcCaller};

// ============================================
// CHAIN PIPELINE
// ============================================

pub struct ChainPipeline {
    cfg: &'static ChainConfig,
    rpc: Arc<dyn RemoteCaller>,
}

impl ChainPipeline {
    pub fn new(chain: Chain, rpc: Arc<dyn RemoteCaller>) -> Self {
        Self { cfg: chain.config(), rpc }
    }

    pub fn chain(&self) -> Chain {
        self.cfg.chain
    }

    /// Enumerate, fetch, price and derive every active market on this chain
    pub async fn run(&self, prices: &dyn PriceSource) -> Result<Vec<MarketMetrics>> {
        let start = Instant::now();
        let rpc = self.rpc.as_ref();
        let cfg = self.cfg;

        let markets = enumerate_markets(rpc, cfg).await?;

        // Prices only need the market list, so they overlap the reserve reads
        let (state, quotes) = tokio::try_join!(
            fetch_market_state(rpc, cfg, &markets),
            resolve_prices(prices, cfg.chain, &markets),
        )?;

        let incentives = fetch_incentive_state(rpc, cfg, &state).await?;
        let joined = snapshots(&state, &incentives)
            .wrap_err_with(|| format!("{}: joining market state", cfg.chain))?;

        let metrics = derive_chain(cfg, &joined, &incentives, &quotes);

        info!(
            "{}: {} markets, {} active, {} prices in {:?}",
            cfg.chain,
            markets.len(),
            metrics.len(),
            quotes.len(),
            start.elapsed()
        );

        Ok(metrics)
    }
}

// ============================================
// REPORT
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChainFailure {
    pub chain: Chain,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Registry order, then market order within a chain
    pub records: Vec<PoolRecord>,
    pub succeeded: Vec<Chain>,
    pub failures: Vec<ChainFailure>,
    /// Active markets left out for an absent or non-finite value
    pub dropped: usize,
}

impl AggregateReport {
    /// True when chains ran and none of them produced a result
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failures.is_empty()
    }
}

// ============================================
// AGGREGATOR
// ============================================

pub struct Aggregator {
    pipelines: Vec<ChainPipeline>,
    prices: Arc<dyn PriceSource>,
}

impl Aggregator {
    pub fn new(prices: Arc<dyn PriceSource>) -> Self {
        Self {
            pipelines: Vec::new(),
            prices,
        }
    }

    /// Add (or replace) a chain; pipelines stay in registry order
    pub fn with_chain(mut self, chain: Chain, rpc: Arc<dyn RemoteCaller>) -> Self {
        self.pipelines.retain(|p| p.chain() != chain);
        self.pipelines.push(ChainPipeline::new(chain, rpc));
        self.pipelines.sort_by_key(|p| p.chain());
        self
    }

    /// Production wiring: Multicall3 over HTTP per chain, coins.llama.fi prices
    pub fn from_config(config: &Config) -> Result<Self> {
        let prices = LlamaPrices::new(config.prices_api_url.clone(), config.http_timeout_secs)?;

        let mut aggregator = Self::new(Arc::new(prices));
        for chain in &config.chains {
            let rpc = RpcCaller::new(config.rpc_url(*chain).to_string(), config.max_calls_per_batch)
                .wrap_err_with(|| format!("{}: RPC client", chain))?;
            aggregator = aggregator.with_chain(*chain, Arc::new(rpc));
        }

        Ok(aggregator)
    }

    pub fn chains(&self) -> Vec<Chain> {
        self.pipelines.iter().map(ChainPipeline::chain).collect()
    }

    pub async fn run(&self) -> AggregateReport {
        let start = Instant::now();
        let prices = self.prices.as_ref();

        let results = join_all(self.pipelines.iter().map(|p| async move {
            (p.chain(), p.run(prices).await)
        }))
        .await;

        let mut report = AggregateReport::default();

        for (chain, result) in results {
            match result {
                Ok(metrics) => {
                    let (records, dropped) = finalize(metrics);
                    report.records.extend(records);
                    report.dropped += dropped;
                    report.succeeded.push(chain);
                }
                Err(e) => {
                    warn!("{}: chain skipped: {:#}", chain, e);
                    report.failures.push(ChainFailure {
                        chain,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        info!(
            "{} records from {}/{} chains ({} dropped) in {:?}",
            report.records.len(),
            report.succeeded.len(),
            self.pipelines.len(),
            report.dropped,
            start.elapsed()
        );

        report
    }
}

/// Output records for one chain, plus how many markets were left out
fn finalize(metrics: Vec<MarketMetrics>) -> (Vec<PoolRecord>, usize) {
    let total = metrics.len();
    let records: Vec<PoolRecord> = metrics
        .into_iter()
        .filter_map(|m| {
            let (chain, symbol, asset) = (m.chain, m.symbol.clone(), m.asset);
            let record = PoolRecord::from_metrics(m);
            if record.is_none() {
                trace!("{}: dropping {} ({:?}), absent or non-finite field", chain, symbol, asset);
            }
            record
        })
        .collect();

    let dropped = total - records.len();
    (records, dropped)
}
