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
    /// recipient key fingerprint
    #[clap(long, value_parser)]
    recipient: String,
    /// amount to transfer
    #[clap(long, value_parser)]
    amount: u64,
    /// message attached to the transfer
    #[clap(long, value_parser, default_value = "")]
    message: String,
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
        recipient,
        amount,
        message,
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
    let recipient: Fingerprint = recipient
        .parse()
        .context("The recipient fingerprint is not valid")?;
    let ledger = HttpLedgerClient::new(config.endpoint)?;
    let cache = WalletCache::new(Duration::from_secs(config.cache_ttl_secs));
    let service = WalletService::new(ledger, cache);

    let receipt = service.transfer(&owner, &recipient, amount, &message).await?;
    println!("transferred {} units with coins:", receipt.amount);
    for coin in receipt.coins.iter() {
        println!("  {coin}");
    }

    Ok(())
}
