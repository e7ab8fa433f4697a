use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from `config/Config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads application configuration by layering the TOML file and
    /// `STRANGLE_`-prefixed environment variables over the built-in
    /// defaults, then overlaying the Dhan credential variables.
    ///
    /// Sections are addressed in the environment with `__`, e.g.
    /// `STRANGLE_STRATEGY__LOT_SIZE=15`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let mut config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("STRANGLE_").split("__"))
            .extract()?;

        config.dhan.apply_env_credentials();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.strategy.underlying, "BANKNIFTY");
        assert_eq!(config.export.trade_log, "data/trade_log.csv");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Config.toml");
        std::fs::write(
            &path,
            r#"
            [strategy]
            underlying = "NIFTY"
            short_otm_distance = 200
            sl_percentage = 30.0
            entry_time = "09:25:00"

            [export]
            trade_log = "out/rounds.csv"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.strategy.underlying, "NIFTY");
        assert_eq!(config.strategy.short_otm_distance, 200);
        assert_eq!(config.strategy.sl_percentage, dec!(30));
        assert_eq!(
            config.strategy.entry_time,
            chrono::NaiveTime::from_hms_opt(9, 25, 0).unwrap()
        );
        // untouched sections keep their defaults
        assert_eq!(config.strategy.hedge_distance, 500);
        assert_eq!(config.export.snapshot_log, "data/snapshots.csv");
        assert_eq!(config.export.trade_log, "out/rounds.csv");
    }
}
