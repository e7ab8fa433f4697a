pub mod clock;
pub mod config;
pub mod config_loader;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, DhanConfig, ExportConfig, StrategyConfig};
pub use config_loader::ConfigLoader;
pub use traits::MarketDataSource;
pub use types::{OptionRight, OrderSide, Quote, SecurityId};
