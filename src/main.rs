//! Radiant Yields - per-market APY records for Radiant v2
//!
//! Run with: cargo run -- --pretty
//!
//! Records go to stdout (or `--output`); logs and the summary go to stderr.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use console::style;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radiant_yields::{AggregateReport, Chain, Config};

#[derive(Parser, Debug)]
#[command(name = "radiant-yields", version, about = "Radiant v2 lending yields across chains")]
struct Cli {
    /// TOML config file (default: environment / .env)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only these chains (repeatable)
    #[arg(long = "chain")]
    chains: Vec<Chain>,

    /// Write records here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// No configuration box or run summary
    #[arg(long)]
    quiet: bool,
}

fn print_report(report: &AggregateReport) {
    eprintln!();
    eprintln!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    eprintln!("{}", style(" RADIANT V2 YIELDS").cyan().bold());
    eprintln!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );

    for chain in &report.succeeded {
        let count = report.records.iter().filter(|r| r.chain == *chain).count();
        eprintln!("  {} {:<10} {} pools", style("✓").green(), chain.name(), count);
    }
    for failure in &report.failures {
        eprintln!("  {} {:<10} {}", style("✗").red(), failure.chain.name(), style(&failure.error).dim());
    }

    eprintln!();
    eprintln!(
        "  Records: {}   Dropped (no price / non-finite): {}",
        style(report.records.len()).bold(),
        report.dropped
    );

    if let Some(best) = report
        .records
        .iter()
        .max_by(|a, b| (a.apy_base + a.apy_reward).total_cmp(&(b.apy_base + b.apy_reward)))
    {
        eprintln!(
            "  Top supply APY: {} on {} at {:.2}% ({:.2}% base + {:.2}% RDNT)",
            style(&best.symbol).yellow(),
            best.chain,
            best.apy_base + best.apy_reward,
            best.apy_base,
            best.apy_reward
        );
    }
    eprintln!();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("radiant_yields=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load {}", path.display()))?,
        None => Config::from_env()?,
    };
    config.restrict_to(&cli.chains);
    config.validate()?;

    if !cli.quiet {
        config.print_summary();
    }

    info!("Aggregating {} chain(s)", config.chains.len());
    let report = radiant_yields::apy(&config).await?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report.records)?
    } else {
        serde_json::to_string(&report.records)?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} records to {}", report.records.len(), path.display());
        }
        None => println!("{}", json),
    }

    if !cli.quiet {
        print_report(&report);
    }

    if report.all_failed() {
        return Err(eyre!("All {} chain(s) failed", report.failures.len()));
    }

    Ok(())
}
