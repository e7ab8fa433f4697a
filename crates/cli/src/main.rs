use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use strangle_core::{AppConfig, Clock, ConfigLoader, SystemClock};
use strangle_data::{CsvSnapshotLog, CsvTradeLog};
use strangle_dhan::{CatalogSource, DailyCatalogStore, DhanClient};
use strangle_engine::{LegRole, StrategyEngine};

#[derive(Parser)]
#[command(name = "strangle-bot")]
#[command(about = "Paper-trading bot for the 9:20 hedged strangle on NSE index options", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full trading session (entry, monitoring, square-off)
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Capture current strangle premiums without entering a position
    Snapshot {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Expiry date (YYYY-MM-DD); defaults to the nearest weekly expiry
        #[arg(long)]
        expiry: Option<NaiveDate>,
        /// Spot level override; defaults to the live index print
        #[arg(long)]
        spot: Option<Decimal>,
    },
    /// List instrument catalog rows matching a name
    Instruments {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Case-insensitive name filter; defaults to the configured underlying
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config } => {
            run_session(&config).await?;
        }
        Commands::Snapshot {
            config,
            expiry,
            spot,
        } => {
            run_snapshot(&config, expiry, spot).await?;
        }
        Commands::Instruments { config, name } => {
            run_instruments(&config, name.as_deref()).await?;
        }
    }

    Ok(())
}

fn load_config(config_path: &str) -> anyhow::Result<AppConfig> {
    tracing::info!("Loading config from: {}", config_path);
    ConfigLoader::load_from(config_path)
}

/// Quote requests need credentials; the public scrip master does not.
fn require_credentials(config: &AppConfig) -> anyhow::Result<()> {
    if !config.dhan.has_credentials() {
        anyhow::bail!(
            "Dhan credentials missing: set DHAN_CLIENT_ID and DHAN_ACCESS_TOKEN \
             or fill the [dhan] section of the config file"
        );
    }
    Ok(())
}

fn build_engine(config: &AppConfig) -> StrategyEngine<DailyCatalogStore, DhanClient, CsvTradeLog> {
    let catalog = DailyCatalogStore::new(
        config.dhan.scrip_master_url.as_str(),
        config.dhan.cache_dir.as_str(),
    );
    let market = DhanClient::new(&config.dhan);
    let trade_log = CsvTradeLog::new(config.export.trade_log.as_str());
    StrategyEngine::new(
        catalog,
        market,
        trade_log,
        Arc::new(SystemClock),
        config.strategy.clone(),
    )
}

async fn run_session(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    require_credentials(&config)?;

    let engine = build_engine(&config);
    let position = engine.run().await?;

    println!("\n{}", "=".repeat(72));
    println!(
        "Session result - {} {} (spot {})",
        config.strategy.underlying, position.date, position.spot_price
    );
    println!("{}", "=".repeat(72));
    println!(
        "{:<10} {:>8} {:>10} {:>10} {:>12}  {}",
        "Leg", "Strike", "Entry", "Exit", "P/L", "Status"
    );
    println!("{}", "-".repeat(72));
    for role in LegRole::ALL {
        let leg = position.leg(role);
        println!(
            "{:<10} {:>8} {:>10} {:>10} {:>12}  {:?}",
            role.label(),
            leg.strike,
            leg.entry_price,
            leg.exit_price,
            leg.realized_pnl,
            leg.status,
        );
    }
    println!("{}", "-".repeat(72));
    println!("Net credit: {}", position.net_credit);
    println!("Total P/L:  {}", position.total_pnl.unwrap_or_default());

    Ok(())
}

async fn run_snapshot(
    config_path: &str,
    expiry: Option<NaiveDate>,
    spot: Option<Decimal>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    require_credentials(&config)?;

    let engine = build_engine(&config);
    let row = engine.capture_snapshot(expiry, spot).await?;

    CsvSnapshotLog::new(config.export.snapshot_log.as_str()).append(&row)?;

    println!("\n{}", "=".repeat(48));
    println!(
        "Strangle snapshot - {} at {}",
        config.strategy.underlying, row.captured_at
    );
    println!("{}", "=".repeat(48));
    println!("Spot:   {}", row.spot_price);
    println!("Expiry: {}", expiry.map_or("nearest weekly".to_string(), |d| d.to_string()));
    println!("{:<10} {:>8} {:>10}", "Leg", "Strike", "Premium");
    println!("{}", "-".repeat(48));
    println!(
        "{:<10} {:>8} {:>10}",
        "Short CE", row.short_call_strike, row.short_call_premium
    );
    println!(
        "{:<10} {:>8} {:>10}",
        "Hedge CE", row.hedge_call_strike, row.hedge_call_premium
    );
    println!(
        "{:<10} {:>8} {:>10}",
        "Short PE", row.short_put_strike, row.short_put_premium
    );
    println!(
        "{:<10} {:>8} {:>10}",
        "Hedge PE", row.hedge_put_strike, row.hedge_put_premium
    );
    println!("{}", "-".repeat(48));
    println!("Net credit: {}", row.net_credit);

    Ok(())
}

async fn run_instruments(config_path: &str, name: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    print_instruments(&config, name, Arc::new(SystemClock)).await
}

async fn print_instruments(
    config: &AppConfig,
    name: Option<&str>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<()> {
    let needle = name.unwrap_or(&config.strategy.underlying);

    let store = DailyCatalogStore::new(
        config.dhan.scrip_master_url.as_str(),
        config.dhan.cache_dir.as_str(),
    );
    let catalog = store.catalog_for(clock.now().date()).await?;
    let rows = catalog.rows_matching_name(needle);

    println!("\n{}", "=".repeat(96));
    println!(
        "Instruments matching '{}' ({} of {} rows)",
        needle,
        rows.len(),
        catalog.len()
    );
    println!("{}", "=".repeat(96));
    println!(
        "{:<8} {:<8} {:<36} {:>12} {:>12}",
        "Exchange", "Type", "Trading Symbol", "Security Id", "Expiry"
    );
    println!("{}", "-".repeat(96));
    for record in rows {
        println!(
            "{:<8} {:<8} {:<36} {:>12} {:>12}",
            record.exchange,
            record.instrument_type,
            record.trading_symbol,
            record.security_id.as_str(),
            record.expiry.map_or("-".to_string(), |d| d.to_string()),
        );
    }

    Ok(())
}
