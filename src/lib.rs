//! Radiant v2 yields
//!
//! Per-market supply/borrow APY, reward APY, TVL and LTV for Radiant v2 on
//! every chain it is deployed on, as records for a yield aggregation platform.
//!
//! ```text
//! registry -> enumerate -> reserve state ─┬─> incentives -> derive -> records
//!                                prices ──┘
//! ```

pub mod aggregator;
pub mod config;
pub mod contracts;
pub mod fetcher;
pub mod metrics;
pub mod pool;
pub mod prices;
pub mod registry;
pub mod rpc;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregator::{AggregateReport, Aggregator, ChainFailure, ChainPipeline};
pub use config::Config;
pub use pool::PoolRecord;
pub use registry::{Chain, ChainConfig};

/// Run every configured chain against live endpoints
pub async fn apy(config: &Config) -> eyre::Result<AggregateReport> {
    Ok(Aggregator::from_config(config)?.run().await)
}
