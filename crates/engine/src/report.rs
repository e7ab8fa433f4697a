//! Flattens a settled position into the trade log row and the end-of-run
//! summary lines.

use tracing::info;

use strangle_data::TradeLogRow;

use crate::position::{LegRole, Position};

/// One trade log row from a settled position.
#[must_use]
pub fn trade_log_row(position: &Position) -> TradeLogRow {
    let short_call = position.leg(LegRole::ShortCall);
    let hedge_call = position.leg(LegRole::HedgeCall);
    let short_put = position.leg(LegRole::ShortPut);
    let hedge_put = position.leg(LegRole::HedgePut);

    TradeLogRow {
        date: position.date,
        entry_time: position.entered_at,
        spot_price: position.spot_price,
        short_call_strike: short_call.strike,
        short_call_entry: short_call.entry_price,
        short_call_sl: short_call.stop_loss.unwrap_or_default(),
        short_call_exit: short_call.exit_price,
        short_call_pnl: short_call.realized_pnl,
        hedge_call_strike: hedge_call.strike,
        hedge_call_entry: hedge_call.entry_price,
        hedge_call_exit: hedge_call.exit_price,
        hedge_call_pnl: hedge_call.realized_pnl,
        short_put_strike: short_put.strike,
        short_put_entry: short_put.entry_price,
        short_put_sl: short_put.stop_loss.unwrap_or_default(),
        short_put_exit: short_put.exit_price,
        short_put_pnl: short_put.realized_pnl,
        hedge_put_strike: hedge_put.strike,
        hedge_put_entry: hedge_put.entry_price,
        hedge_put_exit: hedge_put.exit_price,
        hedge_put_pnl: hedge_put.realized_pnl,
        net_credit: position.net_credit,
        total_pnl: position.total_pnl.unwrap_or_default(),
    }
}

/// Logs the per-leg outcomes and the round total.
pub fn log_summary(position: &Position) {
    for role in LegRole::ALL {
        let leg = position.leg(role);
        info!(
            leg = %role,
            strike = leg.strike,
            entry = %leg.entry_price,
            exit = %leg.exit_price,
            pnl = %leg.realized_pnl,
            status = ?leg.status,
            "Leg result"
        );
    }
    info!(
        date = %position.date,
        spot = %position.spot_price,
        expiry = %position.expiry,
        net_credit = %position.net_credit,
        total_pnl = %position.total_pnl.unwrap_or_default(),
        "Round complete"
    );
}
