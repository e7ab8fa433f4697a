//! Session orchestration: one `run` call is one complete trading round.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, warn};

use strangle_core::{Clock, MarketDataSource, Quote, SecurityId, StrategyConfig};
use strangle_data::TradeLog;
use strangle_dhan::{option_symbol, CatalogError, CatalogSource, InstrumentCatalog};

use crate::position::{Leg, LegRole, LegStatus, Position};
use crate::report;
use crate::stops;
use crate::strikes::StrikeLadder;

/// Failures that abort a session before any leg is opened.
///
/// Once legs are open there is nothing left to abort: quote dropouts are
/// absorbed (`Quote::Unavailable`) and export failures are logged, so the
/// round always settles.
#[derive(Debug, Error)]
pub enum RunError {
    /// Instrument catalog could not be fetched or searched.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The cash-segment index row is missing from the catalog.
    #[error("index '{underlying}' not found in instrument catalog")]
    IndexNotFound { underlying: String },

    /// The index quote carried no price, so no strikes can be picked.
    #[error("no spot price available for '{underlying}'")]
    SpotUnavailable { underlying: String },

    /// An option contract symbol did not resolve to a security id.
    #[error("could not resolve {role} contract '{symbol}'")]
    SymbolResolution { role: LegRole, symbol: String },
}

/// Drives one hedged-strangle round from entry wait to trade log row.
///
/// Generic over its catalog source, market data source, and trade log so
/// tests can run a full session against fakes in virtual time.
pub struct StrategyEngine<C, M, L> {
    pub(crate) catalog_source: C,
    pub(crate) market: M,
    pub(crate) trade_log: L,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: StrategyConfig,
}

impl<C, M, L> StrategyEngine<C, M, L>
where
    C: CatalogSource,
    M: MarketDataSource,
    L: TradeLog,
{
    #[must_use]
    pub fn new(
        catalog_source: C,
        market: M,
        trade_log: L,
        clock: Arc<dyn Clock>,
        config: StrategyConfig,
    ) -> Self {
        Self {
            catalog_source,
            market,
            trade_log,
            clock,
            config,
        }
    }

    /// Runs one full session:
    /// 1. Wait for the entry time
    /// 2. Load the day's instrument catalog
    /// 3. Fix the strike ladder from the index spot
    /// 4. Resolve all four contracts (all-or-nothing)
    /// 5. Record hypothetical entries and the net credit
    /// 6. Poll the short legs against their stops until exit
    /// 7. Square off whatever is still open
    /// 8. Settle, append the trade log row, and report
    ///
    /// # Errors
    ///
    /// Returns a `RunError` only for pre-entry failures; see the error type.
    pub async fn run(&self) -> Result<Position, RunError> {
        info!(
            underlying = %self.config.underlying,
            entry_time = %self.config.entry_time,
            exit_time = %self.config.exit_time,
            sl_percentage = %self.config.sl_percentage,
            lot_size = self.config.lot_size,
            dev_mode = self.config.dev_mode,
            "Strangle session starting"
        );

        // 1. Hold until the entry window
        self.wait_until_entry().await;
        let entered_at = self.clock.now();

        // 2. Instrument catalog for the day
        let catalog = self.catalog_source.catalog_for(entered_at.date()).await?;
        info!(instruments = catalog.len(), "Instrument catalog ready");

        // 3. Spot print fixes the strike ladder and the expiry
        let spot = self.fetch_spot(&catalog).await?;
        let expiry = catalog.nearest_weekly_expiry(&self.config.underlying, entered_at.date())?;
        let ladder = StrikeLadder::compute(
            spot,
            self.config.short_otm_distance,
            self.config.hedge_distance,
        );
        info!(
            spot = %spot,
            expiry = %expiry,
            short_call = ladder.short_call,
            hedge_call = ladder.hedge_call,
            short_put = ladder.short_put,
            hedge_put = ladder.hedge_put,
            "Strike ladder selected"
        );

        // 4. Resolve every contract before opening any leg
        let legs = self.build_legs(&catalog, expiry, ladder)?;
        let mut position = Position::new(entered_at.date(), entered_at, spot, expiry, legs);

        // 5. Hypothetical entry at last traded premiums
        self.open_legs(&mut position).await;

        // 6. Watch the short legs until exit time or both stop out
        self.monitor(&mut position).await;

        // 7. Square off whatever is still open
        self.close_remaining(&mut position).await;

        // 8. Settle and persist
        let total = position.settle(self.config.lot_size);
        info!(net_credit = %position.net_credit, total_pnl = %total, "Session settled");

        let row = report::trade_log_row(&position);
        if let Err(e) = self.trade_log.append(&row) {
            error!(error = %e, "Failed to append trade log row");
        }
        report::log_summary(&position);

        Ok(position)
    }

    /// Sleeps in coarse steps until the clock passes the entry time. Dev
    /// mode skips the wait and enters immediately.
    async fn wait_until_entry(&self) {
        if self.config.dev_mode {
            info!("Dev mode: entering immediately");
            return;
        }
        loop {
            if self.clock.now().time() >= self.config.entry_time {
                return;
            }
            self.clock
                .sleep(Duration::from_secs(self.config.entry_wait_secs))
                .await;
        }
    }

    /// True while monitoring should continue. Dev mode never monitors, so
    /// the session falls straight through to square-off.
    fn before_exit(&self) -> bool {
        !self.config.dev_mode && self.clock.now().time() < self.config.exit_time
    }

    pub(crate) async fn fetch_spot(&self, catalog: &InstrumentCatalog) -> Result<Decimal, RunError> {
        let index_id = catalog
            .resolve_index(&self.config.underlying)?
            .ok_or_else(|| RunError::IndexNotFound {
                underlying: self.config.underlying.clone(),
            })?;

        let quote = match self.market.index_ltp(&index_id).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(error = %e, "Index quote request failed");
                Quote::Unavailable
            }
        };

        quote.price().ok_or_else(|| RunError::SpotUnavailable {
            underlying: self.config.underlying.clone(),
        })
    }

    pub(crate) fn build_legs(
        &self,
        catalog: &InstrumentCatalog,
        expiry: NaiveDate,
        ladder: StrikeLadder,
    ) -> Result<[Leg; 4], RunError> {
        let build = |role: LegRole| -> Result<Leg, RunError> {
            let strike = match role {
                LegRole::ShortCall => ladder.short_call,
                LegRole::HedgeCall => ladder.hedge_call,
                LegRole::ShortPut => ladder.short_put,
                LegRole::HedgePut => ladder.hedge_put,
            };
            let symbol = option_symbol(&self.config.underlying, expiry, strike, role.right());
            let security_id = catalog
                .resolve_option(&symbol)?
                .ok_or_else(|| RunError::SymbolResolution {
                    role,
                    symbol: symbol.clone(),
                })?;
            info!(leg = %role, symbol = %symbol, security_id = %security_id, "Leg resolved");
            Ok(Leg::new(role, strike, symbol, security_id))
        };

        Ok([
            build(LegRole::ShortCall)?,
            build(LegRole::HedgeCall)?,
            build(LegRole::ShortPut)?,
            build(LegRole::HedgePut)?,
        ])
    }

    /// Records entry premiums for all four legs and fixes the net credit.
    /// A leg whose quote is unavailable enters at zero so the round can
    /// still complete.
    async fn open_legs(&self, position: &mut Position) {
        for role in LegRole::ALL {
            let security_id = position.leg(role).security_id.clone();
            let entry = match self.fetch_option(&security_id).await.price() {
                Some(price) => price,
                None => {
                    warn!(leg = %role, "No entry quote, recording zero premium");
                    Decimal::ZERO
                }
            };

            let leg = position.leg_mut(role);
            leg.open(entry, self.config.sl_percentage);
            match leg.stop_loss {
                Some(stop) => {
                    info!(leg = %role, side = %role.side(), entry = %entry, stop = %stop, "Leg opened");
                }
                None => info!(leg = %role, side = %role.side(), entry = %entry, "Leg opened"),
            }
        }

        position.fix_net_credit();
        info!(net_credit = %position.net_credit, "Position entered");
    }

    /// Polls the short legs against their stops every `poll_interval_secs`.
    /// Returns early once both shorts are closed so the hedges can be
    /// squared off without waiting for the exit time.
    async fn monitor(&self, position: &mut Position) {
        while self.before_exit() {
            for role in [LegRole::ShortCall, LegRole::ShortPut] {
                let (security_id, stop) = {
                    let leg = position.leg(role);
                    if leg.status != LegStatus::Open {
                        continue;
                    }
                    let Some(stop) = leg.stop_loss else { continue };
                    (leg.security_id.clone(), stop)
                };

                let Quote::Known(price) = self.fetch_option(&security_id).await else {
                    warn!(leg = %role, "No quote this poll, skipping stop check");
                    continue;
                };

                if stops::breaches_stop(price, stop) {
                    let now = self.clock.now();
                    position.leg_mut(role).close_by_stop(price, now);
                    warn!(leg = %role, price = %price, stop = %stop, "Stop loss hit, leg closed");
                }
            }

            if position.shorts_closed() {
                info!("Both short legs closed, squaring off hedges early");
                return;
            }

            self.clock
                .sleep(Duration::from_secs(self.config.poll_interval_secs))
                .await;
        }
    }

    /// Squares off every leg still open at the current quote. An
    /// unavailable quote exits at zero rather than leaving the leg open.
    async fn close_remaining(&self, position: &mut Position) {
        for role in LegRole::ALL {
            let security_id = {
                let leg = position.leg(role);
                if leg.status != LegStatus::Open {
                    continue;
                }
                leg.security_id.clone()
            };

            let exit = match self.fetch_option(&security_id).await.price() {
                Some(price) => price,
                None => {
                    warn!(leg = %role, "No exit quote, recording zero premium");
                    Decimal::ZERO
                }
            };

            let now = self.clock.now();
            position.leg_mut(role).close_eod(exit, now);
            info!(leg = %role, exit = %exit, "Leg squared off");
        }
    }

    /// Option quote with transport failures demoted to `Unavailable`.
    pub(crate) async fn fetch_option(&self, security_id: &SecurityId) -> Quote {
        match self.market.option_ltp(security_id).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(security_id = %security_id, error = %e, "Option quote request failed");
                Quote::Unavailable
            }
        }
    }
}
