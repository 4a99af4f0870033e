use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ucoin_wallet::cache::WalletCache;
use ucoin_wallet::denomination::Denomination;
use ucoin_wallet::flows::WalletService;
use ucoin_wallet::ledger::HttpLedgerClient;
use ucoin_wallet::model::Fingerprint;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    endpoint: String,
    fingerprint: String,
    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    5 * 60
}

/// `AMOUNT:COUNT`, e.g. `500:2` mints two 500-unit coins.
fn parse_quantity(s: &str) -> Result<(u64, u64), String> {
    let (amount, count) = s
        .split_once(':')
        .ok_or_else(|| format!("expected AMOUNT:COUNT, got {s:?}"))?;
    let amount = amount
        .parse()
        .map_err(|_| format!("invalid amount {amount:?}"))?;
    let count = count
        .parse()
        .map_err(|_| format!("invalid count {count:?}"))?;
    Ok((amount, count))
}

#[derive(Parser, Debug)]
#[clap(version)]
pub struct Cli {
    /// path to config file
    #[clap(long, value_parser)]
    config_path: PathBuf,
    /// denomination quantities to mint, e.g. --coin 500:1 --coin 100:2;
    /// with no --coin the outstanding remainders are listed instead
    #[clap(long = "coin", value_parser = parse_quantity)]
    coins: Vec<(u64, u64)>,
}

#[tokio::main]
async fn main() {
    let result = _main().await;
    result.unwrap();
}

async fn _main() -> anyhow::Result<()> {
    // Start logging setup block
    let fmt_layer = tracing_subscriber::fmt::layer().with_test_writer();

    tracing_subscriber::registry().with(fmt_layer).init();

    let Cli { config_path, coins } = Cli::parse();

    tracing::info!("Config file {:?}", config_path);
    let file = File::open(&config_path).with_context(|| {
        format!(
            "Cannot read config file {path}",
            path = config_path.display()
        )
    })?;
    let config: Config = serde_yaml::from_reader(file).with_context(|| {
        format!(
            "Cannot read config file {path}",
            path = config_path.display()
        )
    })?;

    let owner: Fingerprint = config
        .fingerprint
        .parse()
        .context("The fingerprint in the config file is not valid")?;
    let ledger = HttpLedgerClient::new(config.endpoint)?;
    let cache = WalletCache::new(Duration::from_secs(config.cache_ttl_secs));
    let mut service = WalletService::new(ledger, cache);

    if coins.is_empty() {
        let remainders = service.outstanding_dividends(&owner).await?;
        if remainders.is_empty() {
            println!("no outstanding dividend");
            return Ok(());
        }
        for (amendment, remainder) in remainders.iter() {
            println!("amendment {amendment}: {remainder} units unclaimed");
        }
        println!("mintable denominations:");
        for row in service.issuance_plan(&owner).await? {
            println!("  {} x{}", row.denomination.amount(), row.available);
        }
        return Ok(());
    }

    let requested: Vec<(Denomination, u64)> = coins
        .into_iter()
        .map(|(amount, count)| {
            Denomination::from_amount(amount)
                .map(|denomination| (denomination, count))
                .with_context(|| format!("{amount} is not a mintable denomination"))
        })
        .collect::<anyhow::Result<_>>()?;

    let report = service.issue_dividends(&owner, &requested).await?;
    for (amendment, coins) in report.submitted.iter() {
        let minted: u64 = coins.iter().map(Denomination::amount).sum();
        println!(
            "amendment {amendment}: minted {} coins worth {minted}",
            coins.len()
        );
    }

    Ok(())
}
