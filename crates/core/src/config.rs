use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub strategy: StrategyConfig,
    pub dhan: DhanConfig,
    pub export: ExportConfig,
}

/// Parameters of the 9:20 hedged strangle session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Index underlying, e.g. "BANKNIFTY".
    pub underlying: String,
    /// Points from the strike base to the short strikes.
    pub short_otm_distance: i64,
    /// Points from the short strikes to the hedge strikes.
    pub hedge_distance: i64,
    /// Stop-loss markup on short entry premiums, in percent.
    pub sl_percentage: Decimal,
    /// Contract multiplier used for P/L.
    pub lot_size: u32,
    /// Session entry time, exchange-local.
    pub entry_time: NaiveTime,
    /// Square-off cutoff, exchange-local.
    pub exit_time: NaiveTime,
    /// Seconds between short-leg premium polls.
    pub poll_interval_secs: u64,
    /// Seconds between clock checks while holding for the entry time.
    pub entry_wait_secs: u64,
    /// Skip the entry wait and the monitoring loop; one pass through the
    /// session for testing outside market hours.
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhanConfig {
    pub client_id: String,
    pub access_token: String,
    pub api_url: String,
    pub scrip_master_url: String,
    /// Directory holding the day's cached scrip master.
    pub cache_dir: String,
}

impl DhanConfig {
    /// Overlays credentials from `DHAN_CLIENT_ID` / `DHAN_ACCESS_TOKEN`.
    /// Environment values win over file values.
    pub fn apply_env_credentials(&mut self) {
        if let Ok(client_id) = std::env::var("DHAN_CLIENT_ID") {
            if !client_id.is_empty() {
                tracing::debug!("Using DHAN_CLIENT_ID from environment");
                self.client_id = client_id;
            }
        }
        if let Ok(access_token) = std::env::var("DHAN_ACCESS_TOKEN") {
            if !access_token.is_empty() {
                tracing::debug!("Using DHAN_ACCESS_TOKEN from environment");
                self.access_token = access_token;
            }
        }
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.access_token.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Completed rounds, one CSV row per session.
    pub trade_log: String,
    /// One-shot captures from the snapshot command.
    pub snapshot_log: String,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            underlying: "BANKNIFTY".to_string(),
            short_otm_distance: 300,
            hedge_distance: 500,
            sl_percentage: Decimal::from(25),
            lot_size: 15,
            entry_time: NaiveTime::from_hms_opt(9, 20, 0).unwrap(),
            exit_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            poll_interval_secs: 60,
            entry_wait_secs: 5,
            dev_mode: false,
        }
    }
}

impl Default for DhanConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            access_token: String::new(),
            api_url: "https://api.dhan.co".to_string(),
            scrip_master_url: "https://images.dhan.co/api-data/api-scrip-master.csv".to_string(),
            cache_dir: "data/instruments".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            trade_log: "data/trade_log.csv".to_string(),
            snapshot_log: "data/snapshots.csv".to_string(),
        }
    }
}
