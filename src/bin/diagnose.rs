//! Diagnostic tool - Check configuration and chain reachability
//!
//! Run with: cargo run --bin diagnose

use color_eyre::eyre::Result;
use std::env;
use std::time::Instant;

use radiant_yields::fetcher::enumerate_markets;
use radiant_yields::rpc::RpcCaller;
use radiant_yields::{Chain, Config};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    println!("🔍 RADIANT YIELDS DIAGNOSTIC CHECK\n");

    let config = Config::from_env()?;

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("CHAINS", "arbitrum,bsc,ethereum", "Chains to aggregate"),
        ("PRICES_API_URL", "https://coins.llama.fi", "Price API base URL"),
        ("HTTP_TIMEOUT_SECS", "15", "Price API timeout"),
        ("MAX_CALLS_PER_BATCH", "100", "Multicall3 chunk size"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    match config.validate() {
        Ok(()) => println!("  Config: ✅ Valid"),
        Err(e) => println!("  Config: ❌ {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                  CHAIN REACHABILITY                ");
    println!("═══════════════════════════════════════════════════\n");

    for chain in Chain::all() {
        if !config.chains.contains(&chain) {
            println!("  {:<10} ⏭  disabled", chain.name());
            continue;
        }

        let url = config.rpc_url(chain);
        let url_display = if url.chars().count() > 50 {
            let head: String = url.chars().take(30).collect();
            format!("{}...", head)
        } else {
            url.to_string()
        };
        println!("  {:<10} {}", chain.name(), url_display);

        let rpc = match RpcCaller::new(url.to_string(), config.max_calls_per_batch) {
            Ok(rpc) => rpc,
            Err(e) => {
                println!("    └─ ❌ {:#}\n", e);
                continue;
            }
        };
        let start = Instant::now();
        match enumerate_markets(&rpc, chain.config()).await {
            Ok(markets) => println!(
                "    └─ ✅ {} reserves listed ({:?})\n",
                markets.len(),
                start.elapsed()
            ),
            Err(e) => println!("    └─ ❌ {:#}\n", e),
        }
    }

    println!("✅ Diagnostic complete!\n");
    Ok(())
}
