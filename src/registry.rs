//! Chain Registry
//!
//! Static table of every network Radiant v2 is deployed on and the protocol
//! contracts the pipeline talks to there. Pure data, loaded once.

use alloy_primitives::{address, Address};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================
// PROTOCOL CONSTANTS
// ============================================

/// Project tag shared by every output record
pub const PROJECT: &str = "radiant-v2";

/// RDNT - the incentive controller's reward token
pub const REWARD_TOKEN: Address = address!("0c4681e6c0235179ec3d4f4fc4df3d14fdd96017");

/// RDNT is priced on Arbitrum, where it is most liquid, whatever chain is processed
pub const REWARD_PRICE_CHAIN: Chain = Chain::Arbitrum;

/// Base of the per-market app link
pub const APP_URL: &str = "https://app.radiant.capital/#/asset-detail/";

// ============================================
// CHAINS
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Arbitrum,
    Bsc,
    Ethereum,
}

impl Chain {
    /// Lower-case name, used as the price qualifier and the output `chain` field
    pub fn name(&self) -> &'static str {
        match self {
            Chain::Arbitrum => "arbitrum",
            Chain::Bsc => "bsc",
            Chain::Ethereum => "ethereum",
        }
    }

    /// Environment variable overriding this chain's RPC endpoint
    pub fn rpc_env_var(&self) -> &'static str {
        match self {
            Chain::Arbitrum => "ARBITRUM_RPC_URL",
            Chain::Bsc => "BSC_RPC_URL",
            Chain::Ethereum => "ETHEREUM_RPC_URL",
        }
    }

    pub fn config(&self) -> &'static ChainConfig {
        match self {
            Chain::Arbitrum => &CHAINS[0],
            Chain::Bsc => &CHAINS[1],
            Chain::Ethereum => &CHAINS[2],
        }
    }

    pub fn all() -> Vec<Chain> {
        CHAINS.iter().map(|c| c.chain).collect()
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Chain {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "arbitrum" | "arb" => Ok(Chain::Arbitrum),
            "bsc" | "binance" => Ok(Chain::Bsc),
            "ethereum" | "eth" | "mainnet" => Ok(Chain::Ethereum),
            other => Err(eyre!("Unknown chain '{}'", other)),
        }
    }
}

/// Protocol deployment on one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain: Chain,
    pub lending_pool: Address,
    pub data_provider: Address,
    pub incentive_controller: Address,
    /// Appended to the asset-detail link (the chain's market id)
    pub url_suffix: Address,
    /// Public endpoint used when no override is configured
    pub default_rpc_url: &'static str,
}

pub static CHAINS: [ChainConfig; 3] = [
    ChainConfig {
        chain: Chain::Arbitrum,
        lending_pool: address!("F4B1486DD74D07706052A33d31d7c0AAFD0659E1"),
        data_provider: address!("596B0cc4c5094507C50b579a662FE7e7b094A2cC"),
        incentive_controller: address!("ebC85d44cefb1293707b11f707bd3CEc34B4D5fA"),
        url_suffix: address!("091d52CacE1edc5527C99cDCFA6937C1635330E4"),
        default_rpc_url: "https://arb1.arbitrum.io/rpc",
    },
    ChainConfig {
        chain: Chain::Bsc,
        lending_pool: address!("d50Cf00b6e600Dd036Ba8eF475677d816d6c4281"),
        data_provider: address!("2f9D57E97C3DFED8676e605BC504a48E0c5917E9"),
        incentive_controller: address!("7C16aBb090d3FB266E9d17F60174B632f4229933"),
        url_suffix: address!("63764769dA006395515c3f8afF9c91A809eF6607"),
        default_rpc_url: "https://bsc-dataseed.bnbchain.org",
    },
    ChainConfig {
        chain: Chain::Ethereum,
        lending_pool: address!("A950974f64aA33f27F6C5e017eEE93BF7588ED07"),
        data_provider: address!("362f3BB63Cff83bd169aE1793979E9e537993813"),
        incentive_controller: address!("14b0A611230Dc48E9cc048d3Ae5279847Bf30919"),
        url_suffix: address!("70e507f1d20AeC229F435cd1EcaC6A7200119B9F"),
        default_rpc_url: "https://eth.llamarpc.com",
    },
];
