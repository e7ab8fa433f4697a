//! One-shot strangle capture without entering a position.
//!
//! Resolves the same ladder the live session would pick, reads the four
//! premiums once, and reports what the net credit would be right now.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use strangle_core::{MarketDataSource, Quote};
use strangle_data::{SnapshotRow, TradeLog};
use strangle_dhan::CatalogSource;

use crate::engine::{RunError, StrategyEngine};
use crate::position::{Leg, LegRole};
use crate::strikes::StrikeLadder;

impl<C, M, L> StrategyEngine<C, M, L>
where
    C: CatalogSource,
    M: MarketDataSource,
    L: TradeLog,
{
    /// Captures the strangle as it stands at this moment.
    ///
    /// `expiry` and `spot` override the live lookups when given; otherwise
    /// the nearest weekly expiry and the current index print are used.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons session entry would: no catalog, no spot,
    /// or an unresolvable contract.
    pub async fn capture_snapshot(
        &self,
        expiry: Option<NaiveDate>,
        spot: Option<Decimal>,
    ) -> Result<SnapshotRow, RunError> {
        let now = self.clock.now();
        let catalog = self.catalog_source.catalog_for(now.date()).await?;

        let spot = match spot {
            Some(spot) => spot,
            None => self.fetch_spot(&catalog).await?,
        };
        let expiry = match expiry {
            Some(expiry) => expiry,
            None => catalog.nearest_weekly_expiry(&self.config.underlying, now.date())?,
        };

        let ladder = StrikeLadder::compute(
            spot,
            self.config.short_otm_distance,
            self.config.hedge_distance,
        );
        let legs = self.build_legs(&catalog, expiry, ladder)?;

        let mut premiums = [Decimal::ZERO; 4];
        for leg in &legs {
            premiums[leg.role.index()] = self.premium_or_zero(leg).await;
        }

        let short_call = premiums[LegRole::ShortCall.index()];
        let hedge_call = premiums[LegRole::HedgeCall.index()];
        let short_put = premiums[LegRole::ShortPut.index()];
        let hedge_put = premiums[LegRole::HedgePut.index()];
        let net_credit = short_call + short_put - hedge_call - hedge_put;

        info!(
            spot = %spot,
            expiry = %expiry,
            net_credit = %net_credit,
            "Snapshot captured"
        );

        Ok(SnapshotRow {
            date: now.date(),
            captured_at: now,
            spot_price: spot,
            short_call_strike: ladder.short_call,
            short_call_premium: short_call,
            hedge_call_strike: ladder.hedge_call,
            hedge_call_premium: hedge_call,
            short_put_strike: ladder.short_put,
            short_put_premium: short_put,
            hedge_put_strike: ladder.hedge_put,
            hedge_put_premium: hedge_put,
            net_credit,
        })
    }

    async fn premium_or_zero(&self, leg: &Leg) -> Decimal {
        match self.fetch_option(&leg.security_id).await {
            Quote::Known(price) => price,
            Quote::Unavailable => {
                warn!(leg = %leg.role, symbol = %leg.symbol, "No quote, recording zero premium");
                Decimal::ZERO
            }
        }
    }
}
