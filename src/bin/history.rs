use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ucoin_wallet::cache::WalletCache;
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

#[derive(Parser, Debug)]
#[clap(version)]
pub struct Cli {
    /// path to config file
    #[clap(long, value_parser)]
    config_path: PathBuf,
    /// drop cached history before fetching
    #[clap(long)]
    refresh: bool,
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

    let Cli {
        config_path,
        refresh,
    } = Cli::parse();

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

    if refresh {
        service.refresh_history(&owner);
    }

    let history = service.history(&owner).await?;
    for tx in history.sent.iter() {
        println!(
            "sent     #{} {} -> {} ({} units) {}",
            tx.number,
            tx.sender,
            tx.recipient,
            tx.amount(),
            tx.comment
        );
    }
    for tx in history.received.iter() {
        println!(
            "received #{} {} -> {} ({} units) {}",
            tx.number,
            tx.sender,
            tx.recipient,
            tx.amount(),
            tx.comment
        );
    }

    let (balance, coins) = service.balance(&owner).await?;
    println!("{} spendable coins, balance {}", coins.len(), balance);

    Ok(())
}
