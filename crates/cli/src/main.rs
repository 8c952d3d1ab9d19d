//! Command-line entry point.
//!
//! `hodl serve` runs the full engine (trigger monitor + REST API); the
//! other subcommands are one-shot operations against the same runtime
//! wiring, useful for scripting and for exercising a devnet setup.

mod format;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use format::{format_magnitude, format_price};
use hodl_api::{ApiServer, AppState, ServerConfig};
use hodl_clients::{
    AccountAddress, AdvisoryClient, CoinMarketCapFeed, DevnetLedger, LlmAdvisory, PriceFeed,
    SigningKey,
};
use hodl_domain::prelude::*;
use hodl_engine::{
    EngineConfig, EventBus, ExecutionCoordinator, MonitorConfig, SettlementConfig,
    SettlementExecutor, StrategyService, TriggerMonitor,
    service::{DeployRequest, NewAsset},
};
use hodl_store::{MemoryStore, PostgresStore, StrategyStore};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "hodl", about = "Automated take-profit / stop-loss engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the trigger monitor and the REST API.
    Serve,
    /// Run the trigger monitor only.
    Monitor,
    /// Fetch current quotes for a comma-separated symbol list.
    Quotes {
        /// e.g. DOGE,SHIB,PEPE
        symbols: String,
    },
    /// Deploy a strategy from the command line.
    Deploy {
        /// Owner's ledger address; settlement is credited here.
        #[arg(long)]
        owner: String,
        /// conservative | moderate | aggressive
        #[arg(long, default_value = "moderate")]
        profile: String,
        /// Source take-profit targets from the advisory.
        #[arg(long)]
        ai_take_profit: bool,
        /// Source stop-loss targets from the advisory.
        #[arg(long)]
        ai_stop_loss: bool,
        /// Assets as SYMBOL:QUANTITY, repeatable.
        #[arg(long = "asset", required = true)]
        assets: Vec<String>,
    },
    /// Sell one asset immediately.
    Sell {
        strategy_id: Uuid,
        symbol: String,
    },
    /// Show the execution history for one asset.
    History {
        strategy_id: Uuid,
        symbol: String,
    },
}

struct Runtime {
    service: Arc<StrategyService>,
    monitor: TriggerMonitor,
    events: EventBus,
    network: String,
}

async fn build_runtime(config: &EngineConfig) -> anyhow::Result<Runtime> {
    let store: Arc<dyn StrategyStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .context("connecting to DATABASE_URL")?;
            let store = PostgresStore::new(Arc::new(pool));
            store.migrate().await.context("running migrations")?;
            info!("using Postgres store");
            Arc::new(store)
        }
        None => {
            info!("no DATABASE_URL set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let Some(feed_key) = &config.feed_api_key else {
        bail!("CMC_API_KEY is not set");
    };
    let feed: Arc<dyn PriceFeed> = Arc::new(CoinMarketCapFeed::new(feed_key.clone()));

    let advisory: Option<Arc<dyn AdvisoryClient>> = config
        .advisory_api_key
        .as_ref()
        .map(|key| Arc::new(LlmAdvisory::new(key.clone())) as Arc<dyn AdvisoryClient>);

    let vendor_key = SigningKey::from_env("VENDOR_SIGNING_KEY").ok();
    let seller_key = SigningKey::from_env("SELLER_SIGNING_KEY").ok();
    let mint_authority = vendor_key
        .as_ref()
        .map(|k| k.address().clone())
        .unwrap_or_else(|| AccountAddress::new("0xvendor"));
    let ledger = Arc::new(DevnetLedger::new(mint_authority));

    let settlement = SettlementExecutor::new(
        ledger,
        SettlementConfig {
            mode: config.settlement_mode,
            vendor_key,
            seller_key,
            confirmation_timeout: config.settlement_timeout,
        },
    );

    let events = EventBus::new();
    let coordinator = Arc::new(ExecutionCoordinator::new(
        store.clone(),
        settlement,
        events.clone(),
        config.network.clone(),
    ));
    let service = Arc::new(StrategyService::new(
        store.clone(),
        feed.clone(),
        advisory,
        coordinator.clone(),
        events.clone(),
    ));
    let monitor = TriggerMonitor::new(
        store,
        feed,
        coordinator,
        events.clone(),
        MonitorConfig {
            interval: config.eval_interval,
        },
    );

    Ok(Runtime {
        service,
        monitor,
        events,
        network: config.network.clone(),
    })
}

fn parse_asset(spec: &str) -> anyhow::Result<NewAsset> {
    let (symbol, quantity) = spec
        .split_once(':')
        .with_context(|| format!("asset {spec:?} is not SYMBOL:QUANTITY"))?;
    Ok(NewAsset {
        symbol: symbol.trim().to_uppercase(),
        quantity: Decimal::from_str(quantity.trim())
            .with_context(|| format!("bad quantity in {spec:?}"))?,
    })
}

fn parse_profile(profile: &str) -> anyhow::Result<RiskProfile> {
    match profile {
        "conservative" => Ok(RiskProfile::Conservative),
        "moderate" => Ok(RiskProfile::Moderate),
        "aggressive" => Ok(RiskProfile::Aggressive),
        other => bail!("unknown risk profile {other:?}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;

    match cli.command {
        Command::Serve => {
            let runtime = build_runtime(&config).await?;
            let server = ApiServer::new(ServerConfig::from_env());
            let state = AppState::new(
                runtime.service.clone(),
                runtime.events.clone(),
                runtime.network.clone(),
            );

            let monitor = runtime.monitor;
            tokio::select! {
                result = server.run(state) => result.context("API server exited")?,
                () = monitor.start() => {}
            }
        }
        Command::Monitor => {
            let runtime = build_runtime(&config).await?;
            runtime.monitor.start().await;
        }
        Command::Quotes { symbols } => {
            let runtime = build_runtime(&config).await?;
            let symbols: Vec<String> = symbols
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            let quotes = runtime.service.quotes(&symbols).await?;
            let mut listed: Vec<_> = quotes.values().collect();
            listed.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            for quote in listed {
                println!(
                    "{:<8} {:<14} {:>14} 24h {:>8}% mcap {:>10} risk {}",
                    quote.symbol,
                    quote.name,
                    format_price(quote.price.value),
                    quote.change_24h.round_dp(2),
                    format_magnitude(quote.market_cap),
                    quote.risk.as_str()
                );
            }
        }
        Command::Deploy {
            owner,
            profile,
            ai_take_profit,
            ai_stop_loss,
            assets,
        } => {
            let runtime = build_runtime(&config).await?;
            let request = DeployRequest {
                owner_address: owner,
                risk_profile: parse_profile(&profile)?,
                ai_take_profit,
                ai_stop_loss,
                assets: assets
                    .iter()
                    .map(|s| parse_asset(s))
                    .collect::<anyhow::Result<_>>()?,
            };
            let strategy = runtime.service.deploy_strategy(request).await?;
            println!("deployed strategy {}", strategy.id);
            for asset in &strategy.assets {
                println!(
                    "  {:<8} qty {} entry {} tp {:?} sl {:?}",
                    asset.symbol,
                    asset.quantity,
                    asset.entry_price,
                    asset.thresholds.take_profit.map(|p| p.value),
                    asset.thresholds.stop_loss.map(|p| p.value),
                );
            }
        }
        Command::Sell {
            strategy_id,
            symbol,
        } => {
            let runtime = build_runtime(&config).await?;
            let record = runtime
                .service
                .sell_now(StrategyId(strategy_id), &symbol)
                .await?;
            println!(
                "sold {} {} at {} for {} settlement units",
                record.quantity, record.symbol, record.execution_price, record.settlement_amount
            );
            if let Some(tx_id) = &record.tx_id {
                println!("tx: {}", hodl_engine::explorer_url(&runtime.network, tx_id));
            }
        }
        Command::History {
            strategy_id,
            symbol,
        } => {
            let runtime = build_runtime(&config).await?;
            let records = runtime
                .service
                .history(StrategyId(strategy_id), &symbol)
                .await?;
            if records.is_empty() {
                println!("no executions for {symbol}");
            }
            for record in records {
                println!(
                    "{} {:<12} {:<8} qty {} at {} -> {} [{}]",
                    record.executed_at.format("%Y-%m-%d %H:%M:%S"),
                    record.reason.as_str(),
                    record.symbol,
                    record.quantity,
                    record.execution_price,
                    record.settlement_amount,
                    if record.success { "ok" } else { "failed" },
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn asset_specs_parse() {
        let asset = parse_asset("doge:1000").unwrap();
        assert_eq!(asset.symbol, "DOGE");
        assert_eq!(asset.quantity, dec!(1000));

        assert!(parse_asset("DOGE").is_err());
        assert!(parse_asset("DOGE:lots").is_err());
    }

    #[test]
    fn profiles_parse() {
        assert_eq!(
            parse_profile("aggressive").unwrap(),
            RiskProfile::Aggressive
        );
        assert!(parse_profile("yolo").is_err());
    }
}
