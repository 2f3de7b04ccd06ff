//! Runtime configuration
//!
//! Which chains to aggregate, where to reach them, and the price API. Loaded
//! from the environment (and `.env`) or from a TOML file.

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::prices::{DEFAULT_PRICES_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::registry::Chain;
use crate::rpc::DEFAULT_MAX_CALLS_PER_BATCH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chains to aggregate, registry order
    pub chains: Vec<Chain>,

    /// Per-chain RPC overrides; unset chains use the registry default
    pub rpc_urls: BTreeMap<Chain, String>,

    /// Price API base URL
    pub prices_api_url: String,

    /// HTTP timeout for the price API
    pub http_timeout_secs: u64,

    /// Multicall3 chunk size
    pub max_calls_per_batch: usize,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let chains = match env::var("CHAINS") {
            Ok(list) => Self::parse_chains(&list)?,
            Err(_) => defaults.chains,
        };

        let rpc_urls = Chain::all()
            .into_iter()
            .filter_map(|chain| env::var(chain.rpc_env_var()).ok().map(|url| (chain, url)))
            .collect();

        Ok(Self {
            chains,
            rpc_urls,
            prices_api_url: env::var("PRICES_API_URL")
                .unwrap_or(defaults.prices_api_url),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            max_calls_per_batch: env::var("MAX_CALLS_PER_BATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_calls_per_batch),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Comma-separated chain names, duplicates dropped, registry order
    pub fn parse_chains(list: &str) -> Result<Vec<Chain>> {
        let mut chains = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Chain>>>()?;
        chains.sort();
        chains.dedup();
        Ok(chains)
    }

    /// Keep only `selected` chains (no-op when empty)
    pub fn restrict_to(&mut self, selected: &[Chain]) {
        if !selected.is_empty() {
            self.chains.retain(|c| selected.contains(c));
        }
    }

    pub fn rpc_url(&self, chain: Chain) -> &str {
        self.rpc_urls
            .get(&chain)
            .map(String::as_str)
            .unwrap_or(chain.config().default_rpc_url)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chains.is_empty() {
            return Err(eyre!("No chains enabled"));
        }

        for chain in &self.chains {
            let url = self.rpc_url(*chain);
            if url.trim().is_empty() || url.contains("YOUR_API_KEY") {
                return Err(eyre!(
                    "Invalid RPC URL for {} - set {}",
                    chain,
                    chain.rpc_env_var()
                ));
            }
        }

        if self.prices_api_url.trim().is_empty() {
            return Err(eyre!("PRICES_API_URL is empty"));
        }
        if self.http_timeout_secs == 0 {
            return Err(eyre!("HTTP_TIMEOUT_SECS must be > 0"));
        }
        if self.max_calls_per_batch == 0 {
            return Err(eyre!("MAX_CALLS_PER_BATCH must be > 0"));
        }

        Ok(())
    }

    /// Print configuration summary (stderr; stdout carries the records)
    pub fn print_summary(&self) {
        eprintln!("╔════════════════════════════════════════════════════════════╗");
        eprintln!("║              RADIANT YIELDS - CONFIGURATION                ║");
        eprintln!("╠════════════════════════════════════════════════════════════╣");
        for chain in &self.chains {
            let source = if self.rpc_urls.contains_key(chain) { "override" } else { "default" };
            eprintln!("║ {:<10} {:>38} ({:<8}) ║", chain.name(), shorten(self.rpc_url(*chain)), source);
        }
        eprintln!("╠════════════════════════════════════════════════════════════╣");
        eprintln!("║ Prices API:        {:<40} ║", shorten(&self.prices_api_url));
        eprintln!("║ HTTP timeout:      {:<40} ║", format!("{}s", self.http_timeout_secs));
        eprintln!("║ Calls per batch:   {:<40} ║", self.max_calls_per_batch);
        eprintln!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// Keep long (key-bearing) URLs readable
fn shorten(url: &str) -> String {
    if url.chars().count() > 38 {
        let head: String = url.chars().take(26).collect();
        let tail: String = url.chars().rev().take(9).collect::<Vec<_>>().into_iter().rev().collect();
        format!("{}...{}", head, tail)
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chains: Chain::all(),
            rpc_urls: BTreeMap::new(),
            prices_api_url: DEFAULT_PRICES_API_URL.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_calls_per_batch: DEFAULT_MAX_CALLS_PER_BATCH,
        }
    }
}
